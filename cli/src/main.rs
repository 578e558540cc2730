use anyhow::Result;
use clap::{Parser, Subcommand};
use strata_migrate::Runner;
use strata_store::MetaStore;

mod migrations;

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Schema migrations for collection stores")]
struct Opt {
    /// Database URI.
    #[arg(long, global = true, default_value = "sqlite://strata.db?mode=rwc")]
    db_uri: String,
    /// Size of the database connection pool.
    #[arg(long, global = true, default_value_t = 1)]
    nr_connections: u32,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Apply all pending migrations.
    Up,
    /// Roll back the most recently applied migrations.
    Down {
        /// How many migrations to roll back.
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// List applied migrations.
    History,
    /// Clear an advisory lock left behind by a crashed batch.
    Unlock,
}

async fn run(opt: Opt) -> Result<()> {
    let store = MetaStore::connect(&opt.db_uri, opt.nr_connections).await?;
    store.create_tables().await?;
    let set = migrations::set()?;

    match opt.cmd {
        Cmd::Up => {
            let report = Runner::new(&store, &set).up().await?;
            if report.migrations.is_empty() {
                println!("no pending migrations");
            }
            for id in &report.migrations {
                println!("applied {}", id);
            }
        }
        Cmd::Down { count } => {
            let report = Runner::new(&store, &set).down(count).await?;
            if report.migrations.is_empty() {
                println!("nothing to roll back");
            }
            for id in &report.migrations {
                println!("rolled back {}", id);
            }
        }
        Cmd::History => {
            for record in store.applied_migrations().await? {
                println!("{}\t{}", record.applied, record.id);
            }
        }
        Cmd::Unlock => {
            store.release_lock().await?;
            println!("migration lock cleared");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let opt = Opt::parse();
    if let Err(err) = run(opt).await {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
