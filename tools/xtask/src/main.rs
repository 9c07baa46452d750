//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 chp-runtime 覆盖率
//! - `chp-check`: 批量检查 CHP 文件（解析错误、矩形引用、位图是否存在）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser as CliParser, Subcommand};
use serde::Serialize;
use walkdir::WalkDir;
use xshell::{Shell, cmd};

use chp_host::{EncodingHint, EncodingRsDecoder, FsSource, ResourceSource, TextDecoder};
use chp_runtime::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, Parser, analyze_chara,
    extract_bitmap_references,
};

#[derive(CliParser)]
#[command(name = "xtask")]
#[command(about = "开发辅助工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,

    /// 运行 chp-runtime 覆盖率报告
    CovRuntime,

    /// 检查 CHP 文件
    ///
    /// 不带参数时检查 `chara/` 下所有 .chp 文件；带路径时检查指定文件或目录。
    ChpCheck {
        /// 文件或目录
        path: Option<PathBuf>,

        /// 文本编码（auto / utf8 / utf16 / shift_jis）
        #[arg(long, default_value = "auto")]
        encoding: String,

        /// 以 JSON 输出汇总
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    match cli.command {
        Commands::CheckAll => {
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        Commands::CovRuntime => {
            ensure_cargo_llvm_cov_available(&sh)?;

            eprintln!("\n==> cargo llvm-cov -p chp-runtime --all-features --html");
            cmd!(sh, "cargo llvm-cov -p chp-runtime --all-features --html").run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Commands::ChpCheck {
            path,
            encoding,
            json,
        } => {
            let hint: EncodingHint = serde_json::from_value(serde_json::Value::String(encoding))
                .context("无效的编码（auto / utf8 / utf16 / shift_jis）")?;
            chp_check(path.as_deref(), hint, json)?;
        }
    }

    Ok(())
}

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_err() {
        anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        );
    }
    Ok(())
}

//=============================================================================
// chp-check 命令实现
//=============================================================================

/// 默认检查目录（相对于 workspace root）
const DEFAULT_CHARA_DIR: &str = "chara";

/// 检查结果
#[derive(Default, Serialize)]
struct ChpCheckResult {
    /// 检查的文件数量
    files_checked: usize,
    /// 致命错误（读取、解码或解析失败）
    fatal: Vec<FatalError>,
    /// 诊断结果
    diagnostics: DiagnosticResult,
    /// 缺失的位图
    missing_bitmaps: Vec<MissingBitmap>,
}

#[derive(Serialize)]
struct FatalError {
    file: String,
    message: String,
}

#[derive(Serialize)]
struct MissingBitmap {
    file: String,
    slot: String,
    path: String,
}

impl ChpCheckResult {
    fn error_count(&self) -> usize {
        self.fatal.len() + self.diagnostics.error_count()
    }

    fn warn_count(&self) -> usize {
        self.diagnostics.warn_count() + self.missing_bitmaps.len()
    }
}

/// 执行 CHP 检查
fn chp_check(path: Option<&Path>, hint: EncodingHint, json: bool) -> anyhow::Result<()> {
    let root = path.unwrap_or(Path::new(DEFAULT_CHARA_DIR));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定 CHP 路径",
            root.display()
        );
    }

    let files = collect_chp_files(root);
    if files.is_empty() {
        eprintln!("未找到 CHP 文件（.chp）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个 CHP 文件...\n", files.len());

    let mut result = ChpCheckResult::default();
    for file in &files {
        check_chp_file(file, hint, &mut result);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_check_result(&result);
    }

    if result.error_count() > 0 {
        anyhow::bail!("CHP 检查发现错误");
    }

    Ok(())
}

/// 收集 .chp 文件（扩展名大小写不敏感）
fn collect_chp_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("chp"))
        })
        .collect();
    files.sort();
    files
}

/// 检查单个 CHP 文件
fn check_chp_file(file: &Path, hint: EncodingHint, result: &mut ChpCheckResult) {
    let source_id = file.display().to_string();
    result.files_checked += 1;

    let mut fatal = |message: String| {
        result.fatal.push(FatalError {
            file: source_id.clone(),
            message,
        })
    };

    let bytes = match std::fs::read(file) {
        Ok(b) => b,
        Err(e) => return fatal(format!("无法读取文件 - {e}")),
    };
    let text = match EncodingRsDecoder.decode(&bytes, hint) {
        Ok(t) => t,
        Err(e) => return fatal(e.to_string()),
    };

    let mut parser = Parser::with_source_id(&source_id);
    let chara = match parser.parse(&text) {
        Ok(c) => c,
        Err(e) => return fatal(e.to_string()),
    };

    result.diagnostics.merge(parser.warnings().to_vec().into());
    result.diagnostics.merge(analyze_chara(&chara, &source_id));

    let source = FsSource::new(file.parent().unwrap_or(Path::new(".")));
    for bitmap in extract_bitmap_references(&chara) {
        if !source.exists(&bitmap.path) {
            result.missing_bitmaps.push(MissingBitmap {
                file: source_id.clone(),
                slot: bitmap.slot.directive().to_string(),
                path: bitmap.path,
            });
        }
    }
}

/// 输出检查结果
fn print_check_result(result: &ChpCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个 CHP 文件", result.files_checked);
    eprintln!();

    for fatal in &result.fatal {
        eprintln!("[ERROR] {}: {}", fatal.file, fatal.message);
    }

    let shown: Vec<&Diagnostic> = result.diagnostics.filter_by_level(DiagnosticLevel::Warn);
    for diag in shown {
        eprintln!("{}", diag);
    }

    for mb in &result.missing_bitmaps {
        eprintln!("[WARN] {}: 位图不存在 [#{}] {}", mb.file, mb.slot, mb.path);
    }

    let error_count = result.error_count();
    let warn_count = result.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
