//! rowgate CLI Client
//!
//! Command-line interface for issuing gateway requests.

use clap::{Parser, Subcommand};

use rowgate::backend::ConsistencyLevel;
use rowgate::model::{ColumnParent, ColumnPath, SlicePredicate, SliceRange};
use rowgate::GatewayClient;

/// rowgate CLI
#[derive(Parser, Debug)]
#[command(name = "rowgate-cli")]
#[command(about = "CLI for the rowgate column-store gateway")]
struct Args {
    /// Gateway address
    #[arg(short, long, default_value = "127.0.0.1:10000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch fresh time-ordered UUIDs
    Uuids {
        /// How many to generate
        #[arg(short, long, default_value = "1")]
        count: usize,
    },

    /// Print a keyspace's schema
    Describe {
        /// The keyspace to describe
        keyspace: String,
    },

    /// Get a single column
    Get {
        keyspace: String,
        key: String,
        column_family: String,
        #[arg(long)]
        super_column: Option<String>,
        #[arg(long)]
        column: Option<String>,
    },

    /// Slice columns under a key or super column
    GetSlice {
        keyspace: String,
        key: String,
        column_family: String,
        #[arg(long)]
        super_column: Option<String>,
        /// Select these names explicitly instead of a range (repeatable)
        #[arg(long = "column", value_name = "NAME")]
        columns: Vec<String>,
        #[arg(long, default_value = "")]
        start: String,
        #[arg(long, default_value = "")]
        finish: String,
        #[arg(long)]
        reversed: bool,
        #[arg(long, default_value = "100")]
        count: i32,
    },

    /// Count columns under a key
    Count {
        keyspace: String,
        key: String,
        column_family: String,
        #[arg(long)]
        super_column: Option<String>,
    },

    /// Insert a single column value
    Insert {
        keyspace: String,
        key: String,
        column_family: String,
        column: String,
        value: String,
        #[arg(long)]
        super_column: Option<String>,
        /// Integer microseconds or "auto"
        #[arg(long, default_value = "auto")]
        timestamp: String,
    },

    /// Remove a column, super column, or row
    Remove {
        keyspace: String,
        key: String,
        column_family: String,
        #[arg(long)]
        super_column: Option<String>,
        #[arg(long)]
        column: Option<String>,
        /// Integer microseconds or "auto"
        #[arg(long, default_value = "auto")]
        timestamp: String,
    },
}

fn main() {
    let args = Args::parse();
    let client = GatewayClient::new(args.server);
    let cl = ConsistencyLevel::One;

    let outcome = match args.command {
        Commands::Uuids { count } => client.get_uuids(count).map(|uuids| {
            for uuid in uuids {
                println!("{}", uuid);
            }
        }),

        Commands::Describe { keyspace } => client
            .describe_keyspace(&keyspace)
            .map(|schema| println!("{:#}", schema)),

        Commands::Get {
            keyspace,
            key,
            column_family,
            super_column,
            column,
        } => {
            let path = ColumnPath {
                column_family,
                super_column,
                column,
            };
            client.get(&keyspace, &key, &path, cl).map(|result| {
                if let Some(value) = result {
                    println!("{:#}", value);
                }
            })
        }

        Commands::GetSlice {
            keyspace,
            key,
            column_family,
            super_column,
            columns,
            start,
            finish,
            reversed,
            count,
        } => {
            let parent = ColumnParent {
                column_family,
                super_column,
            };
            let predicate = if columns.is_empty() {
                SlicePredicate::Range(SliceRange {
                    start,
                    finish,
                    reversed,
                    count,
                })
            } else {
                SlicePredicate::Names(columns)
            };
            client
                .get_slice(&keyspace, &key, &parent, &predicate, cl)
                .map(|result| {
                    if let Some(value) = result {
                        println!("{:#}", value);
                    }
                })
        }

        Commands::Count {
            keyspace,
            key,
            column_family,
            super_column,
        } => {
            let parent = ColumnParent {
                column_family,
                super_column,
            };
            client
                .get_count(&keyspace, &key, &parent, cl)
                .map(|count| println!("{}", count))
        }

        Commands::Insert {
            keyspace,
            key,
            column_family,
            column,
            value,
            super_column,
            timestamp,
        } => {
            let path = ColumnPath {
                column_family,
                super_column,
                column: Some(column),
            };
            client
                .insert(&keyspace, &key, &path, &value, &timestamp, cl)
                .map(|ts| println!("{}", ts))
        }

        Commands::Remove {
            keyspace,
            key,
            column_family,
            super_column,
            column,
            timestamp,
        } => {
            let path = ColumnPath {
                column_family,
                super_column,
                column,
            };
            client.remove(&keyspace, &key, &path, &timestamp, cl)
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
