use crate::cli::{Args, Command};
use anyhow::{bail, Context};
use clap::Parser;
use hydra_fusion::client::HttpSparqlClient;
use hydra_fusion::members::assemble;
use hydra_fusion::model::{GraphIndex, NamedNode, Triple};
use hydra_fusion::strategy::StrategyRegistry;
use hydra_fusion::{
    Api, ApiSnapshot, CollectionDescription, CollectionEngine, CollectionOptions,
};
use oxrdfio::{RdfFormat, RdfParser, RdfSerializer};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{stdout, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let collection = NamedNode::new(&args.collection)
        .with_context(|| format!("The collection IRI {} is invalid", args.collection))?;
    let api = load_graph(&args.api)?;
    let data = match &args.data {
        Some(file) => load_graph(file)?,
        None => api.clone(),
    };
    let snapshot = ApiSnapshot::new(api, Arc::new(StrategyRegistry::default()));
    let options = CollectionOptions::default().with_default_page_size(args.page_size);

    match args.command {
        Command::Compile => {
            let description = CollectionDescription::read(&collection, &data, snapshot.graph());
            let params = CollectionEngine::search_params(&description, &args.query);
            let Some(queries) = assemble(&description, &params, snapshot.resolver(), &options)
            else {
                bail!("The collection {collection} has no valid member assertion")
            };
            let mut out = stdout().lock();
            if let Some(page) = queries.page {
                writeln!(out, "# page {} of size {}", page.index, page.size)?;
            }
            writeln!(out, "# members\n{}\n", queries.members)?;
            writeln!(out, "# total\n{}", queries.total)?;
            Ok(())
        }
        Command::Render { endpoint } => {
            let client = Arc::new(HttpSparqlClient::new(endpoint));
            let engine = CollectionEngine::new(client, Arc::new(Api::new(snapshot)))
                .with_options(options);
            let response = engine.render(&collection, &data, &args.query).await?;
            let mut serializer =
                RdfSerializer::from_format(RdfFormat::NTriples).for_writer(stdout().lock());
            for triple in &response.graph {
                serializer.serialize_triple(triple)?;
            }
            serializer.finish()?.flush()?;
            Ok(())
        }
    }
}

/// Reads the default graph of an RDF file. Triples of named graphs are ignored.
fn load_graph(path: &Path) -> anyhow::Result<GraphIndex> {
    let format = rdf_format_from_path(path)?;
    let file = File::open(path).with_context(|| format!("Unable to open {}", path.display()))?;
    let mut triples = Vec::new();
    for quad in RdfParser::from_format(format).for_reader(BufReader::new(file)) {
        let quad = quad.with_context(|| format!("Unable to parse {}", path.display()))?;
        if quad.graph_name.is_default_graph() {
            triples.push(Triple::new(quad.subject, quad.predicate, quad.object));
        }
    }
    tracing::debug!(file = %path.display(), triples = triples.len(), "Loaded graph");
    Ok(GraphIndex::new(triples))
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    if let Some(ext) = path.extension().and_then(OsStr::to_str) {
        RdfFormat::from_extension(ext).with_context(|| {
            format!("Not able to guess the file format from file name extension '{ext}'")
        })
    } else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    }
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use anyhow::Result;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use assert_fs::NamedTempFile;
    use predicates::prelude::*;

    const API: &str = r#"
@prefix hydra: <http://www.w3.org/ns/hydra/core#> .
@prefix query: <https://hypermedia.app/query#> .
@prefix schema: <http://schema.org/> .
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .

<http://example.com/people> a <http://example.com/PeopleCollection> .

<http://example.com/PeopleCollection>
    hydra:memberAssertion [ hydra:property rdf:type ; hydra:object schema:Person ] ;
    hydra:search [
        hydra:template "http://example.com/people{?name}" ;
        hydra:mapping [ hydra:variable "name" ; hydra:property schema:name ]
    ] .
"#;

    fn cli_command() -> Result<Command> {
        Ok(Command::cargo_bin("hydra-fusion")?)
    }

    fn api_file() -> Result<NamedTempFile> {
        let file = NamedTempFile::new("api.ttl")?;
        file.write_str(API)?;
        Ok(file)
    }

    #[test]
    fn cli_help() -> Result<()> {
        cli_command()?
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("Usage"));
        Ok(())
    }

    #[test]
    fn cli_compile() -> Result<()> {
        let api = api_file()?;
        cli_command()?
            .arg("--api")
            .arg(api.path())
            .arg("--collection")
            .arg("http://example.com/people")
            .arg("--query")
            .arg("name=Alice")
            .arg("compile")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("SELECT DISTINCT")
                    .and(predicate::str::contains("COUNT(DISTINCT"))
                    .and(predicate::str::contains("\"Alice\""))
                    .and(predicate::str::contains("<http://schema.org/Person>")),
            );
        Ok(())
    }

    #[test]
    fn cli_compile_without_member_assertion() -> Result<()> {
        let api = api_file()?;
        cli_command()?
            .arg("--api")
            .arg(api.path())
            .arg("--collection")
            .arg("http://example.com/other")
            .arg("compile")
            .assert()
            .failure()
            .stderr(predicate::str::contains("no valid member assertion"));
        Ok(())
    }

    #[test]
    fn cli_unknown_extension() -> Result<()> {
        let api = NamedTempFile::new("api.unknown")?;
        api.write_str(API)?;
        cli_command()?
            .arg("--api")
            .arg(api.path())
            .arg("--collection")
            .arg("http://example.com/people")
            .arg("compile")
            .assert()
            .failure()
            .stderr(predicate::str::contains("file name extension"));
        Ok(())
    }

    #[test]
    fn clap_debug() {
        use clap::CommandFactory;

        Args::command().debug_assert()
    }
}
