use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sitegate::audit::store::AuditStore;
use sitegate::audit::OverrideRecord;
use sitegate::config::{Config, ConfigOverrides};
use sitegate::estimator::estimator_for_offset;
use sitegate::gate::{run_override, OverrideOutcome};
use sitegate::impact::calculator::calculate_impact;
use sitegate::impact::conflicts::detect_conflicts;
use sitegate::output::csv::{conflicts_to_csv, history_to_csv, sites_to_csv};
use sitegate::output::json::render_json;
use sitegate::output::table::{
    render_conflicts_table, render_history_table, render_impact_table,
    render_opportunities_table, render_sites_table,
};
use sitegate::plan::CollectionPlan;
use sitegate::server::run_server;
use sitegate::types::{CollectionOpportunity, Site};
use tracing::warn;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "sitegate",
    about = "Collection override impact analysis and approval gating"
)]
struct Cli {
    /// Path to the collection plan JSON file
    #[arg(short = 'P', long)]
    plan: Option<PathBuf>,
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Fixed quality offset applied by the estimator
    #[arg(long = "quality-offset")]
    quality_offset: Option<f64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List ground sites and their utilization
    Sites,
    /// List collection opportunities and their assignments
    Opportunities,
    /// Compute the impact of moving an opportunity to an alternate site
    Impact {
        #[arg(long)]
        opportunity: String,
        #[arg(long)]
        site: String,
    },
    /// Show opportunities already scheduled on a candidate site
    Conflicts {
        #[arg(long)]
        opportunity: String,
        #[arg(long)]
        site: String,
    },
    /// Run the full override workflow: analyze, gate, confirm, record
    Override {
        #[arg(long)]
        opportunity: String,
        #[arg(long)]
        site: String,
        /// Required when the computed risk score exceeds the approval gate
        #[arg(long)]
        justification: Option<String>,
    },
    /// Show confirmed overrides from the audit trail
    History {
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long)]
        opportunity: Option<String>,
    },
    /// Plan file utilities
    Plan {
        #[arg(long)]
        init: bool,
    },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        plan_path: cli
            .plan
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        quality_offset: cli.quality_offset,
    });

    if let Commands::Config { init, show } = &cli.command {
        if *init {
            Config::write_template(&config_path)?;
            println!("Wrote config template to {}", config_path.display());
        }
        if *show || !*init {
            println!("{}", render_json(&config)?);
        }
        return Ok(());
    }
    if let Commands::Plan { init } = &cli.command {
        let plan_path = config.resolved_plan_path();
        if *init {
            CollectionPlan::write_template(&plan_path)?;
            println!("Wrote sample plan to {}", plan_path.display());
        } else {
            println!("{}", render_json(&load_plan(&config)?)?);
        }
        return Ok(());
    }

    let plan = load_plan(&config)?;

    if let Commands::Serve { host, port } = &cli.command {
        let host = host.clone().unwrap_or_else(|| config.server.host.clone());
        let port = port.unwrap_or(config.server.port);
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, plan, addr).await;
    }

    let estimator = estimator_for_offset(config.estimator.quality_offset);
    let estimator_timeout = Duration::from_millis(config.estimator.timeout_ms);

    match &cli.command {
        Commands::Sites => print_sites(&plan.sites, cli.output)?,
        Commands::Opportunities => print_opportunities(&plan.opportunities, cli.output)?,
        Commands::Impact { opportunity, site } => {
            let (opp, proposed) = resolve_pair(&plan, opportunity, site)?;
            let impact = calculate_impact(
                opp,
                proposed,
                &plan.opportunities,
                estimator.as_ref(),
                estimator_timeout,
            )
            .await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_impact_table(&impact)),
                OutputFormat::Json => println!("{}", render_json(&impact)?),
                OutputFormat::Csv => {
                    warn!("CSV output for impact not implemented, using JSON");
                    println!("{}", render_json(&impact)?);
                }
            }
        }
        Commands::Conflicts { opportunity, site } => {
            let (opp, proposed) = resolve_pair(&plan, opportunity, site)?;
            let conflicts = detect_conflicts(opp, proposed, &plan.opportunities);
            match cli.output {
                OutputFormat::Table => println!("{}", render_conflicts_table(&conflicts)),
                OutputFormat::Json => println!("{}", render_json(&conflicts)?),
                OutputFormat::Csv => println!("{}", conflicts_to_csv(&conflicts)?),
            }
        }
        Commands::Override {
            opportunity,
            site,
            justification,
        } => {
            let (opp, proposed) = resolve_pair(&plan, opportunity, site)?;
            let outcome = run_override(
                opp,
                proposed,
                &plan.opportunities,
                estimator.as_ref(),
                estimator_timeout,
                justification.as_deref(),
            )
            .await?;
            match outcome {
                OverrideOutcome::Confirmed(confirmed) => {
                    let store = AuditStore::open(&config.resolved_db_path())?;
                    store.insert_override(&OverrideRecord::from_confirmed(&confirmed)?)?;
                    match cli.output {
                        OutputFormat::Table => {
                            println!("{}", render_impact_table(&confirmed.impact));
                            println!(
                                "Override confirmed: {} -> {}",
                                confirmed.opportunity_id, confirmed.proposed_site.id
                            );
                        }
                        _ => println!("{}", render_json(&confirmed)?),
                    }
                }
                OverrideOutcome::NeedsJustification { impact } => {
                    println!("{}", render_impact_table(&impact));
                    return Err(anyhow!(
                        "risk score {} requires approval; re-run with --justification",
                        impact.risk_score
                    ));
                }
            }
        }
        Commands::History { limit, opportunity } => {
            let store = AuditStore::open(&config.resolved_db_path())?;
            let records = store.load_history(opportunity.as_deref(), (*limit).max(1))?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_history_table(&records)),
                OutputFormat::Json => println!("{}", render_json(&records)?),
                OutputFormat::Csv => println!("{}", history_to_csv(&records)?),
            }
        }
        Commands::Plan { .. } | Commands::Config { .. } => {}
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
    }

    Ok(())
}

fn load_plan(config: &Config) -> Result<CollectionPlan> {
    let path = config.resolved_plan_path();
    if path.exists() {
        CollectionPlan::load(&path)
    } else {
        warn!(
            "plan file not found at {}, using built-in sample plan",
            path.display()
        );
        Ok(CollectionPlan::sample())
    }
}

fn resolve_pair<'a>(
    plan: &'a CollectionPlan,
    opportunity_id: &str,
    site_id: &str,
) -> Result<(&'a CollectionOpportunity, &'a Site)> {
    let opportunity = plan
        .opportunity(opportunity_id)
        .ok_or_else(|| anyhow!("unknown opportunity: {opportunity_id}"))?;
    let site = plan
        .site(site_id)
        .ok_or_else(|| anyhow!("unknown site: {site_id}"))?;
    Ok((opportunity, site))
}

fn print_sites(sites: &[Site], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_sites_table(sites)),
        OutputFormat::Json => println!("{}", render_json(sites)?),
        OutputFormat::Csv => println!("{}", sites_to_csv(sites)?),
    }
    Ok(())
}

fn print_opportunities(opportunities: &[CollectionOpportunity], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_opportunities_table(opportunities)),
        OutputFormat::Json => println!("{}", render_json(opportunities)?),
        OutputFormat::Csv => {
            warn!("CSV output for opportunities not implemented, using JSON");
            println!("{}", render_json(opportunities)?);
        }
    }
    Ok(())
}
