use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use matjip_common::{assemble_catalog, logger, AppConfig, RestaurantProfile, SearchResult};
use matjip_llm::{format_results, LlmClient, OllamaClient, Recommender};
use matjip_vector::{snapshot_exists, VectorSearchEngine};
use std::path::PathBuf;
use std::sync::Arc;

/// Queries run right after a build to eyeball the new index
const SAMPLE_QUERIES: &[&str] = &[
    "건대 고기집 추천해줘",
    "데이트하기 좋은 일식집",
    "혼밥하기 좋은 면요리집",
    "디저트 카페 추천",
    "회식 장소로 좋은 곳",
];

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "matjip")]
#[command(about = "Matjip - semantic restaurant search over review data", long_about = None)]
struct Cli {
    /// Snapshot directory (overrides INDEX_DIR)
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed restaurant profiles and write a new index snapshot
    Build {
        /// Restaurant profile JSON (overrides DATA_PATH)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Skip the sample queries after building
        #[arg(long)]
        no_samples: bool,
    },

    /// Search the index with a free-text query
    Search {
        /// What you are looking for
        query: String,

        /// Number of restaurants to return
        #[arg(short, long)]
        k: Option<usize>,

        /// Write the recommendation with the LLM instead of the template
        #[arg(long)]
        llm: bool,
    },

    /// List the indexed restaurants
    List,

    /// Show whether an index is available and its size
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv_from_project_root();

    let mut config = AppConfig::from_env()?;
    if let Some(dir) = cli.index_dir {
        config.index_dir = dir;
    }

    let client: Arc<dyn LlmClient> = Arc::new(OllamaClient::new(&config.ollama_base_url)?);

    match cli.command {
        Commands::Build { data, no_samples } => {
            if let Some(path) = data {
                config.data_path = path;
            }
            config.ensure_directories()?;
            logger::setup_logging(&config.log_dir, &config.log_level)?;

            tracing::info!("Matjip index build starting...");
            tracing::info!("  Data: {}", config.data_path.display());
            tracing::info!("  Index: {}", config.index_dir.display());
            tracing::info!("  Embedding model: {}", config.embedding_model);

            let engine = VectorSearchEngine::new(&config, client);
            build(&config, &engine).await?;

            if !no_samples {
                run_samples(&engine).await?;
            }
        }
        Commands::Search { query, k, llm } => {
            logger::setup_console_logging(&config.log_level)?;

            let engine = load_engine(&config, client.clone()).await?;
            let k = k.unwrap_or(config.default_top_k);
            let results = engine.search(&query, k).await?;

            let text = if llm {
                Recommender::new(client, config.llm_model.clone())
                    .recommend(&query, &results)
                    .await
                    .text
            } else {
                format_results(&query, &results)
            };

            println!("{}", text);
            print_details(&results);
        }
        Commands::List => {
            logger::setup_console_logging(&config.log_level)?;

            let engine = load_engine(&config, client).await?;
            let restaurants = engine.restaurants().await?;

            println!("총 {}개 식당 데이터", restaurants.len());
            for r in restaurants {
                println!("- {} ({}) - {}", r.name, r.location, r.menu_type);
            }
        }
        Commands::Stats => {
            logger::setup_console_logging(&config.log_level)?;

            let engine = VectorSearchEngine::new(&config, client);
            if snapshot_exists(&config.index_dir) {
                engine
                    .load(&config.index_dir)
                    .await
                    .context("Failed to load the restaurant index")?;
            }

            let stats = engine.stats().await;
            println!("인덱스: {}", config.index_dir.display());
            println!("상태: {}", if stats.ready { "준비됨" } else { "미구축" });
            println!("식당 수: {}", stats.count);
            println!("차원: {}", stats.dimension);
            println!("임베딩 모델: {}", stats.embedding_model);
        }
    }

    Ok(())
}

async fn build(config: &AppConfig, engine: &VectorSearchEngine) -> Result<()> {
    let raw = std::fs::read_to_string(&config.data_path)
        .with_context(|| format!("Failed to read {}", config.data_path.display()))?;
    let profiles: Vec<RestaurantProfile> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", config.data_path.display()))?;

    if profiles.is_empty() {
        bail!("No restaurants in {}", config.data_path.display());
    }

    let restaurants = assemble_catalog(profiles)?;
    engine.build(restaurants).await?;
    engine.save(&config.index_dir).await?;

    let stats = engine.stats().await;
    println!(
        "벡터 DB 구축 완료: {}개 식당 ({}차원) -> {}",
        stats.count,
        stats.dimension,
        config.index_dir.display()
    );
    Ok(())
}

async fn run_samples(engine: &VectorSearchEngine) -> Result<()> {
    println!("\n=== 테스트 검색 ===");
    for query in SAMPLE_QUERIES {
        println!("\n검색어: '{}'", query);
        for (i, result) in engine.search(query, 3).await?.iter().enumerate() {
            let r = &result.restaurant;
            println!("{}. {} (유사도: {:.3})", i + 1, r.name, result.score);
            println!(
                "   위치: {}, 메뉴: {}, 리뷰: {}개",
                r.location, r.menu_type, r.review_count
            );
        }
    }
    Ok(())
}

async fn load_engine(config: &AppConfig, client: Arc<dyn LlmClient>) -> Result<VectorSearchEngine> {
    if !snapshot_exists(&config.index_dir) {
        bail!(
            "{}에 벡터 DB가 없습니다. `matjip build`를 먼저 실행해주세요.",
            config.index_dir.display()
        );
    }

    let engine = VectorSearchEngine::new(config, client);

    match engine.load(&config.index_dir).await {
        Ok(()) => Ok(engine),
        Err(e) if e.needs_build() => bail!(
            "{}\n벡터 DB가 구축되지 않았습니다. `matjip build`를 먼저 실행해주세요.",
            e
        ),
        Err(e) => Err(e).context("Failed to load the restaurant index"),
    }
}

fn print_details(results: &[SearchResult]) {
    if results.is_empty() {
        return;
    }

    println!("\n📋 상세 정보");
    for (i, result) in results.iter().enumerate() {
        let r = &result.restaurant;
        println!("{}. {} (유사도: {:.3})", i + 1, r.name, result.score);
        println!(
            "   📍 {} | 🍽️ {} | 🎭 {} | 💰 {} | ⭐ {}/5.0 | 📝 리뷰 {}개 | 재방문 {:.1}회",
            r.location, r.menu_type, r.atmosphere, r.price_range, r.rating, r.review_count, r.avg_visits
        );
        println!("   💬 {}", r.summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::try_parse_from(["matjip", "search", "데이트 파스타", "-k", "5", "--llm"]).unwrap();
        match cli.command {
            Commands::Search { query, k, llm } => {
                assert_eq!(query, "데이트 파스타");
                assert_eq!(k, Some(5));
                assert!(llm);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_cli_global_index_dir() {
        let cli = Cli::try_parse_from(["matjip", "list", "--index-dir", "/tmp/idx"]).unwrap();
        assert_eq!(cli.index_dir, Some(PathBuf::from("/tmp/idx")));
        assert!(matches!(cli.command, Commands::List));
    }

    #[tokio::test]
    async fn test_load_engine_without_snapshot_asks_for_build() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            index_dir: tmp.path().join("missing"),
            ..AppConfig::default()
        };
        let client: Arc<dyn LlmClient> = Arc::new(OllamaClient::new(&config.ollama_base_url).unwrap());

        let err = load_engine(&config, client).await.err().unwrap();
        assert!(err.to_string().contains("matjip build"));
    }

    #[test]
    fn test_cli_parses_stats() {
        let cli = Cli::try_parse_from(["matjip", "stats"]).unwrap();
        assert!(matches!(cli.command, Commands::Stats));
    }
}
