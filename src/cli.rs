use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photo-merge")]
#[command(about = "ローカル写真インデックスとWeb投稿メタデータの照合・統合ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 進捗バーを表示しない
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// インデックスとメタデータを照合して統合JSON・レビューCSV・レポートを出力
    Merge {
        /// ローカルインデックスJSON
        #[arg(long, default_value = "site/index.json")]
        index: PathBuf,

        /// 画像メタデータJSON
        #[arg(long, default_value = "oldindianphotos_images_meta.json")]
        meta: PathBuf,

        /// 統合結果JSON
        #[arg(short, long, default_value = "site/index/index.merged.json")]
        out: PathBuf,

        /// レビューCSV
        #[arg(long, default_value = "merge_review.csv")]
        review: PathBuf,

        /// 集計レポート
        #[arg(long, default_value = "merge_report.txt")]
        report: PathBuf,

        /// オーバーライドCSV（folder,title,post_url,image_pos）
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// 投稿採用の最低スコア（デフォルト: 設定値 または 0.50）
        #[arg(long)]
        post_threshold: Option<f64>,

        /// 画像採用の最低スコア（デフォルト: 設定値 または 0.32）
        #[arg(long)]
        image_threshold: Option<f64>,

        /// 追加の同義語JSON
        #[arg(long)]
        synonyms: Option<PathBuf>,

        /// ワーカー数（1で逐次実行）
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// メタデータを投稿単位に集約して一覧表示
    Posts {
        /// 画像メタデータJSON
        #[arg(long, default_value = "oldindianphotos_images_meta.json")]
        meta: PathBuf,

        /// 表示件数
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// 追加の同義語JSON
        #[arg(long)]
        synonyms: Option<PathBuf>,
    },

    /// 1レコードの照合スコア内訳を表示
    Explain {
        /// 対象レコードのID
        #[arg(required = true)]
        id: String,

        /// ローカルインデックスJSON
        #[arg(long, default_value = "site/index.json")]
        index: PathBuf,

        /// 画像メタデータJSON
        #[arg(long, default_value = "oldindianphotos_images_meta.json")]
        meta: PathBuf,

        /// オーバーライドCSV
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// 表示する候補数
        #[arg(short, long, default_value = "5")]
        top: usize,

        /// 追加の同義語JSON
        #[arg(long)]
        synonyms: Option<PathBuf>,
    },

    /// 統合結果を整形（タイトル・タグ・投稿説明）
    Clean {
        /// 統合結果JSON
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ファイル（省略時は上書き）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ドライラン（変更を適用せずプレビュー）
        #[arg(long)]
        dry_run: bool,

        /// タイトルの整形を無効化
        #[arg(long)]
        no_title: bool,

        /// タグの整形を無効化
        #[arg(long)]
        no_tags: bool,

        /// 投稿説明の検証を無効化
        #[arg(long)]
        no_description: bool,
    },

    /// 設定を表示/編集
    Config {
        /// 投稿採用の閾値を設定
        #[arg(long)]
        set_post_threshold: Option<f64>,

        /// 画像採用の閾値を設定
        #[arg(long)]
        set_image_threshold: Option<f64>,

        /// 追加の同義語JSONを設定
        #[arg(long)]
        set_synonyms: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
