use clap::Parser;
use ladder_recipe::domain::ports::BomSource;
use ladder_recipe::utils::error::{ErrorSeverity, RecipeError, Result};
use ladder_recipe::utils::{logger, validation::Validate};
use ladder_recipe::{
    BomFileSource, CliConfig, InMemoryCatalog, LocalStorage, OdooClient, RecipePipeline, RecipeRunner, RunConfig,
    TomlConfig,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting ladder-recipe");
    tracing::info!("Loading configuration from: {}", cli.config);

    let settings = match TomlConfig::from_file(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    let config = RunConfig::new(settings, cli.parent.clone(), cli.child.clone())
        .with_bom_file(cli.bom_file.clone())
        .with_output_override(cli.output.clone())
        .with_timeout_override(cli.timeout);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if cli.verbose {
        tracing::debug!("Run config: {:?}", config);
    }

    let outcome = match config.bom_file.clone() {
        Some(path) => execute(BomFileSource::new(path), config, cli.dry_run).await,
        None => match config.settings.erp.clone() {
            Some(erp) => execute(OdooClient::new(erp), config, cli.dry_run).await,
            None => Err(RecipeError::MissingConfigError {
                field: "erp".to_string(),
            }),
        },
    };

    if let Err(e) = outcome {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Recipe generation failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        if e.is_fatal() {
            let exit_code = match e.severity() {
                ErrorSeverity::Critical => 3,
                ErrorSeverity::Medium => 2,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    }
}

async fn execute<B: BomSource + 'static>(source: B, config: RunConfig, dry_run: bool) -> Result<()> {
    let catalog = InMemoryCatalog::from_dir(config.settings.catalog_path())?;
    let storage = LocalStorage::new(config.settings.output_path());
    let timeout = config.timeout_seconds();

    let runner = RecipeRunner::new(RecipePipeline::new(storage, source, catalog, config));

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        let recipes = runner.preview().await?;
        for recipe in &recipes.recipes {
            println!("{}\n", recipe.text);
        }
        println!(
            "Requested section {} {} docking",
            recipes.requested,
            if recipes.requested_needs_docking {
                "requires"
            } else {
                "does not require"
            }
        );
        return Ok(());
    }

    let written = runner.run_with_timeout(timeout).await?;
    println!("✅ Recipe generation completed successfully!");
    for path in written {
        println!("📁 Output saved to: {}", path);
    }
    Ok(())
}
