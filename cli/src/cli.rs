use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;
use url::Url;

#[derive(Parser)]
#[command(about, version, name = "hydra-fusion")]
/// Hydra Fusion command line tool: compiles Hydra collections into SPARQL queries
pub struct Args {
    /// File with the API description
    ///
    /// The format is guessed from the file extension (Turtle, TriG, N-Triples...).
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub api: PathBuf,
    /// File with the data of the collection resource
    ///
    /// By default the collection is read from the API description.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub data: Option<PathBuf>,
    /// IRI of the collection to compile
    #[arg(long, value_hint = ValueHint::Url)]
    pub collection: String,
    /// Query string of the request, without the leading `?`
    #[arg(long, default_value = "")]
    pub query: String,
    /// Page size used when neither the request nor the collection sets one
    #[arg(long, default_value_t = 10)]
    pub page_size: usize,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the member and total queries of the collection without executing them
    Compile,
    /// Render the requested page of the collection as N-Triples
    Render {
        /// SPARQL query endpoint of the triple store
        #[arg(long, value_hint = ValueHint::Url)]
        endpoint: Url,
    },
}
