use clap::Parser;
use photo_merge::{cli, config, error, export, loader, normalizer, runner};
use cli::{Cli, Commands};
use config::Config;
use error::{PhotoMergeError, Result};
use photo_merge_common::{aggregate_posts, guess_position, RecordFeatures, Thresholds};
use std::path::{Path, PathBuf};

fn init_logging(verbose: bool) {
    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info },
    );
    clog.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Merge {
            index,
            meta,
            out,
            review,
            report,
            overrides,
            post_threshold,
            image_threshold,
            synonyms,
            jobs,
        } => {
            println!("🔗 photo-merge - 照合・統合\n");

            let thresholds = config.thresholds(post_threshold, image_threshold)?;
            let synonyms_path = synonyms.or_else(|| config.synonyms_path.clone());
            let synonyms = loader::load_synonyms(synonyms_path.as_deref())?;

            // 1. 入力読み込み
            println!("[1/4] 入力を読み込み中...");
            let records = loader::load_index(&index)?;
            println!("✔ インデックス: {}件", records.len());

            // 2. 投稿集約
            println!("[2/4] 投稿を集約中...");
            let engine = runner::build_engine(&meta, overrides.as_deref(), synonyms, thresholds)?;
            println!("✔ 投稿: {}件\n", engine.posts().len());

            // 3. 照合
            println!(
                "[3/4] 照合中... (投稿閾値: {}, 画像閾値: {})",
                thresholds.post, thresholds.image
            );
            let options = runner::RunOptions {
                jobs,
                progress: !cli.quiet,
            };
            let output = runner::run_merge(&engine, &records, options)?;
            println!(
                "✔ 照合完了: {}件一致 / {}件要レビュー\n",
                output.summary.matched, output.summary.needs_review
            );

            // 4. 出力
            println!("[4/4] 結果を保存中...");
            let paths = export::OutputPaths {
                merged: out,
                review,
                report,
            };
            export::export_outputs(&output, &paths)?;

            println!("\n✅ 完了");
        }

        Commands::Posts { meta, limit, synonyms } => {
            println!("📚 photo-merge - 投稿一覧\n");
            let synonyms_path = synonyms.or_else(|| config.synonyms_path.clone());
            let synonyms = loader::load_synonyms(synonyms_path.as_deref())?;
            let rows = loader::load_meta(&meta)?;
            let aggregation = aggregate_posts(&rows, &synonyms);

            println!(
                "画像行: {}件（採用 {} / ノイズ除外 {}）",
                rows.len(),
                aggregation.images_kept,
                aggregation.images_dropped
            );
            println!("投稿: {}件\n", aggregation.posts.len());

            for post in aggregation.posts.iter().take(limit) {
                println!("- {}", post.post_title);
                println!("    URL: {}", post.post_url);
                println!(
                    "    画像: {}枚  Part: {}  年代: {}",
                    post.images.len(),
                    post.part.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                    post.post_decade.as_deref().unwrap_or("-")
                );
            }
            if aggregation.posts.len() > limit {
                println!("\n... 他 {}件", aggregation.posts.len() - limit);
            }
        }

        Commands::Explain { id, index, meta, overrides, top, synonyms } => {
            println!("🔍 photo-merge - スコア内訳\n");
            let synonyms_path = synonyms.or_else(|| config.synonyms_path.clone());
            let synonyms = loader::load_synonyms(synonyms_path.as_deref())?;
            let thresholds = config.thresholds(None, None)?;
            explain(&id, &index, &meta, overrides.as_deref(), top, synonyms, thresholds)?;
        }

        Commands::Clean { input, output, dry_run, no_title, no_tags, no_description } => {
            println!("🧹 photo-merge - 統合結果の整形\n");
            clean(&input, output, dry_run, no_title, no_tags, no_description)?;
        }

        Commands::Config { set_post_threshold, set_image_threshold, set_synonyms, show } => {
            let mut config = config;

            if let Some(value) = set_post_threshold {
                config.set_post_threshold(value)?;
                println!("✔ 投稿閾値を設定しました: {}", value);
            }

            if let Some(value) = set_image_threshold {
                config.set_image_threshold(value)?;
                println!("✔ 画像閾値を設定しました: {}", value);
            }

            if let Some(path) = set_synonyms {
                config.set_synonyms_path(path)?;
                println!("✔ 同義語ファイルを設定しました");
            }

            if show {
                println!("設定:");
                println!("  パス: {}", Config::config_path()?.display());
                println!("  投稿閾値: {}", config.post_threshold);
                println!("  画像閾値: {}", config.image_threshold);
                println!(
                    "  同義語ファイル: {}",
                    config
                        .synonyms_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "未設定".into())
                );
            }
        }
    }

    Ok(())
}

fn explain(
    id: &str,
    index: &Path,
    meta: &Path,
    overrides: Option<&Path>,
    top: usize,
    synonyms: photo_merge_common::SynonymTable,
    thresholds: Thresholds,
) -> Result<()> {
    let records = loader::load_index(index)?;
    let record = records
        .iter()
        .find(|r| r.id.to_string() == id)
        .ok_or_else(|| PhotoMergeError::RecordNotFound(id.to_string()))?;

    let engine = runner::build_engine(meta, overrides, synonyms, thresholds)?;
    let features = RecordFeatures::new(record, engine.synonyms());

    println!("レコード {}: {} / {}", record.id, record.folder, record.title);
    println!("  スラッグ: {} / {}", features.folder_slug, features.title_slug);
    println!(
        "  日付: {}  Part: {}\n",
        record.date.as_deref().unwrap_or("-"),
        features.part.map(|p| p.to_string()).unwrap_or_else(|| "-".into())
    );

    let ranked = engine
        .post_matcher()
        .ranked(&features, engine.posts(), engine.post_features(), top);
    for (rank, (post, score)) in ranked.iter().enumerate() {
        println!("{}. {:.3}  {}", rank + 1, score.total, post.post_title);
        println!("     {}", post.post_url);
        println!(
            "     jac={:.3} fuz={:.3} date={:.2} dec={:.2} lab={:.2} part={:.2}",
            score.jaccard,
            score.fuzzy,
            score.date_boost,
            score.decade_boost,
            score.label_boost,
            score.part_bonus
        );
    }

    if let Some((post, _)) = ranked.first() {
        println!("\n最上位投稿内の画像:");
        let guessed = guess_position(record, None);
        let matcher = engine.image_matcher();
        for image in &post.images {
            println!(
                "  {:.3}  pos={}  {}",
                matcher.score(record, image, guessed),
                image.position.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                image.url
            );
        }
    }

    let resolution = engine.resolve(record);
    println!(
        "\n判定: {} (信頼度 {:.4})",
        resolution.outcome.status(),
        resolution.outcome.confidence()
    );

    Ok(())
}

fn clean(
    input: &Path,
    output: Option<PathBuf>,
    dry_run: bool,
    no_title: bool,
    no_tags: bool,
    no_description: bool,
) -> Result<()> {
    let mut records = loader::load_merged(input)?;
    println!("✔ {}件を読み込み", records.len());

    let options = normalizer::NormalizationOptions {
        clean_title: !no_title,
        clean_tags: !no_tags,
        clean_description: !no_description,
    };
    let result = normalizer::normalize_records(&records, &options);

    println!("\n修正案: {}件（{}レコード）", result.corrections.len(), result.stats.corrected_records);
    println!("  タイトル: {}", result.stats.title_corrections);
    println!("  タグ: {}", result.stats.tag_corrections);
    println!("  投稿説明: {}", result.stats.description_corrections);

    if dry_run {
        println!();
        for c in &result.corrections {
            println!("  [{}] {}: {} → {} ({})", c.id, c.field, c.original, c.corrected, c.reason);
        }
        println!("\n（ドライラン: 変更は保存していません）");
        return Ok(());
    }

    normalizer::apply_corrections(&mut records, &result.corrections);
    let target = output.unwrap_or_else(|| input.to_path_buf());
    export::merged::write_merged_json(&records, &target)?;
    println!("\n✅ 保存: {}", target.display());

    Ok(())
}
