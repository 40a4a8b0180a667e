use std::collections::HashMap;
use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use varquery_config::config::{Args, Config, USAGE};
use varquery_http::{GENE_ARGUMENT, Response, seqpeek_data, tabix_lookup, variant_summary};

/// Query tabix indexed variant files and summarize variants against a feature matrix.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = USAGE)]
struct Cli {
  #[command(flatten)]
  args: Args,
  #[command(subcommand)]
  request: Option<Request>,
}

#[derive(Subcommand, Debug)]
enum Request {
  /// Look up a coordinate range in a tabix lookup dataset.
  Lookup {
    /// The id of the dataset.
    id: String,
    chromosome: String,
    start: u64,
    /// Defaults to the start.
    end: Option<u64>,
  },
  /// Summarize the variant at a coordinate for a feature.
  Summary {
    /// The id of the dataset.
    id: String,
    #[arg(long)]
    chromosome: String,
    #[arg(long)]
    coordinate: String,
    #[arg(long)]
    feature_id: String,
  },
  /// Count the variants of a gene against every feature.
  Seqpeek {
    /// The id of the dataset.
    id: String,
    #[arg(long)]
    gene: String,
  },
}

impl Request {
  async fn respond(self, config: &Config) -> Response {
    match self {
      Request::Lookup {
        id,
        chromosome,
        start,
        end,
      } => Response::from_result(tabix_lookup(config, &id, &chromosome, start, end).await),
      Request::Summary {
        id,
        chromosome,
        coordinate,
        feature_id,
      } => {
        let arguments = HashMap::from([
          ("chromosome".to_string(), chromosome),
          ("coordinate".to_string(), coordinate),
          ("feature_id".to_string(), feature_id),
        ]);
        Response::from_result(variant_summary(config, &id, &arguments).await)
      }
      Request::Seqpeek { id, gene } => {
        let arguments = HashMap::from([(GENE_ARGUMENT.to_string(), gene)]);
        Response::from_result(seqpeek_data(config, &id, &arguments).await)
      }
    }
  }
}

#[tokio::main]
async fn main() -> io::Result<ExitCode> {
  let cli = Cli::parse();

  let Some(path) = Config::parse_with_args(&cli.args)? else {
    return Ok(ExitCode::SUCCESS);
  };
  let Some(request) = cli.request else {
    return Err(io::Error::other("expected a lookup, summary or seqpeek subcommand"));
  };

  let config = Config::from_path(&path)?;
  config.setup_tracing()?;

  debug!(config = ?config, "config parsed");

  let response = request.respond(&config).await;
  println!("{}", response.body());

  if response.is_success() {
    Ok(ExitCode::SUCCESS)
  } else {
    warn!(status = %response.status(), "request failed");
    Ok(ExitCode::FAILURE)
  }
}
