//! One-shot schema-embedding seeder (spec.md §6: "Schema knowledge base
//! seeding, one-shot, external tool"). Reads a newline-delimited text
//! file of schema descriptions/exemplars, embeds each via the configured
//! [`EmbeddingProvider`], and upserts into `schema_embeddings`.
//!
//! Idempotent by construction: `content` carries a unique constraint, so
//! re-running with identical input updates the same rows in place rather
//! than duplicating them, and the whole run is one transaction so a
//! failure midway leaves the table untouched (spec.md §6: "MUST NOT
//! produce partial overwrites").

use std::path::PathBuf;

use ask_hoops::config::Config;
use ask_hoops::providers::{EmbeddingProvider, HttpEmbeddingProvider};
use clap::Parser;
use sqlx::Connection;
use sqlx::postgres::PgConnection;

#[derive(Parser, Debug)]
#[command(name = "seed_schema_kb", about = "Seed the schema knowledge base with descriptions and SQL exemplars")]
struct Cli {
    /// Newline-delimited file of schema descriptions / SQL exemplars.
    #[arg(long)]
    input: PathBuf,

    /// Delete rows not present in this run's input before upserting.
    #[arg(long, default_value_t = false)]
    replace: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let contents = std::fs::read_to_string(&cli.input)?;
    let lines: Vec<&str> = contents.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        anyhow::bail!("input file {:?} contains no non-empty lines", cli.input);
    }

    let embedding_provider = HttpEmbeddingProvider::new(
        config.embedding.api_base.clone(),
        config.embedding.api_key.clone(),
        config.embedding.model.clone(),
        config.embedding.timeout_s,
    );

    let mut conn = PgConnection::connect(&config.database.url).await?;
    let mut tx = conn.begin().await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_embeddings (\
            id BIGSERIAL PRIMARY KEY, \
            content TEXT NOT NULL UNIQUE, \
            embedding BYTEA NOT NULL\
        )",
    )
    .execute(&mut *tx)
    .await?;

    if cli.replace {
        let placeholders: Vec<String> = (1..=lines.len()).map(|i| format!("${i}")).collect();
        let sql = format!("DELETE FROM schema_embeddings WHERE content NOT IN ({})", placeholders.join(", "));
        let mut query = sqlx::query(&sql);
        for line in &lines {
            query = query.bind(*line);
        }
        query.execute(&mut *tx).await?;
    }

    let mut seeded = 0usize;
    for line in &lines {
        let vector = embedding_provider.embed(line).await?;
        sqlx::query(
            "INSERT INTO schema_embeddings (content, embedding) VALUES ($1, $2) \
             ON CONFLICT (content) DO UPDATE SET embedding = EXCLUDED.embedding",
        )
        .bind(*line)
        .bind(vector.to_bytes())
        .execute(&mut *tx)
        .await?;
        seeded += 1;
    }

    tx.commit().await?;
    tracing::info!(seeded, replace = cli.replace, "schema knowledge base seeded");

    Ok(())
}
