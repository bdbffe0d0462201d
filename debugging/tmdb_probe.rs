//! Query TMDB through the gateway repository and print the normalized result.
//! Usage:
//!   cargo run --bin tmdb_probe -- movie <tmdb_id>
//!   cargo run --bin tmdb_probe -- similar <tmdb_id> [page]
//!   cargo run --bin tmdb_probe -- search <term> [page]
//!   cargo run --bin tmdb_probe -- top_rated [page]
//!   cargo run --bin tmdb_probe -- upcoming [page]
//!   cargo run --bin tmdb_probe -- genres
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use movie_gateway::config::Config;
use movie_gateway::http::ReqwestTransport;
use movie_gateway::models::Page;
use movie_gateway::tmdb::{MovieRepository, TmdbRepository};
use serde_json::Value;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ProbeKind {
    Movie,
    Similar,
    Search,
    TopRated,
    Upcoming,
    Genres,
}

impl FromStr for ProbeKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(ProbeKind::Movie),
            "similar" => Ok(ProbeKind::Similar),
            "search" => Ok(ProbeKind::Search),
            "top_rated" => Ok(ProbeKind::TopRated),
            "upcoming" => Ok(ProbeKind::Upcoming),
            "genres" => Ok(ProbeKind::Genres),
            _ => Err(anyhow::anyhow!(
                "kind must be one of movie, similar, search, top_rated, upcoming, genres"
            )),
        }
    }
}

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin tmdb_probe -- movie <tmdb_id>");
    eprintln!("       cargo run --bin tmdb_probe -- similar <tmdb_id> [page]");
    eprintln!("       cargo run --bin tmdb_probe -- search <term> [page]");
    eprintln!("       cargo run --bin tmdb_probe -- top_rated|upcoming [page]");
    eprintln!("       cargo run --bin tmdb_probe -- genres");
    std::process::exit(1);
}

fn arg<'a>(args: &'a [String], idx: usize, what: &str) -> Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing {}", what))
}

fn page_arg(args: &[String], idx: usize) -> Result<Option<Page>> {
    args.get(idx)
        .map(|p| {
            p.parse::<Page>()
                .map_err(|_| anyhow::anyhow!("page must be a positive integer"))
        })
        .transpose()
}

fn id_arg(args: &[String], idx: usize) -> Result<i64> {
    arg(args, idx, "tmdb_id")?
        .parse()
        .context("tmdb_id must be an integer")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let kind = ProbeKind::from_str(&args[1])?;
    let config = Config::from_env()?;
    let transport = Arc::new(ReqwestTransport::new(config.http_timeout)?);
    let repo = TmdbRepository::new(transport, config.tmdb_api_key)
        .with_base_url(config.tmdb_base_url);

    let output: Value = match kind {
        ProbeKind::Movie => {
            let id = id_arg(&args, 2)?;
            match repo.find_by_id(id).await? {
                Some(movie) => serde_json::to_value(movie)?,
                None => anyhow::bail!("No TMDB movie found for id {}", id),
            }
        }
        ProbeKind::Similar => {
            let id = id_arg(&args, 2)?;
            serde_json::to_value(repo.find_similar_movies(id, page_arg(&args, 3)?).await?)?
        }
        ProbeKind::Search => {
            let term = arg(&args, 2, "search term")?;
            serde_json::to_value(repo.search_movies(term, page_arg(&args, 3)?).await?)?
        }
        ProbeKind::TopRated => {
            serde_json::to_value(repo.find_top_rated_movies(page_arg(&args, 2)?).await?)?
        }
        ProbeKind::Upcoming => {
            serde_json::to_value(repo.find_upcoming_movies(page_arg(&args, 2)?).await?)?
        }
        ProbeKind::Genres => serde_json::to_value(repo.find_all_genres().await?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
