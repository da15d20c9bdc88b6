//! Operator commands for a TimeFlow deployment.
//!
//! ```bash
//! timeflow-admin migrate-orphans   # personal projects + orphan task repair
//! timeflow-admin check-db          # list tables and count projects
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use timeflow::Config;
use timeflow::database::init_database;
use timeflow::database::repositories::{
    MaintenanceRepository, ProjectRepository, TaskRepository, UserRepository,
};
use timeflow::services::ProvisioningService;

/// TimeFlow maintenance tool
#[derive(Parser, Debug)]
#[command(name = "timeflow-admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Give every user a personal project and move orphan tasks into it
    MigrateOrphans,

    /// Verify the schema is reachable
    CheckDb,
}

async fn migrate_orphans(config: &Config) -> Result<()> {
    let pool = init_database(config).await?;
    let tasks = TaskRepository::new(pool.clone());

    let orphans_before = tasks.count_orphan_tasks().await?;
    log::info!("{} orphan tasks before repair", orphans_before);

    let provisioning = ProvisioningService::new(
        UserRepository::new(pool.clone()),
        ProjectRepository::new(pool.clone()),
        tasks.clone(),
    );
    let summary = provisioning.repair_all().await?;

    let orphans_after = tasks.count_orphan_tasks().await?;
    println!("Users processed:   {}", summary.users_processed);
    println!("Projects created:  {}", summary.projects_created);
    println!("Tasks migrated:    {}", summary.tasks_migrated);
    println!("Orphans remaining: {}", orphans_after);

    Ok(())
}

async fn check_db(config: &Config) -> Result<()> {
    let pool = init_database(config).await?;
    let maintenance = MaintenanceRepository::new(pool);

    let tables = maintenance.list_public_tables().await?;
    println!("Tables ({}):", tables.len());
    for table in &tables {
        println!("  - {}", table);
    }

    let projects = maintenance.count_projects().await?;
    println!("Projects: {}", projects);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::MigrateOrphans => migrate_orphans(&config).await,
        Commands::CheckDb => check_db(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Command failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
