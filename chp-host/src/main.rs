//! # CHP Host
//!
//! 无界面的 CHP 角色查看器命令行。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p chp-host -- info chara/pomyu.chp
//! cargo run -p chp-host -- frame chara/pomyu.chp --state 6 --time 1200
//! cargo run -p chp-host -- frame chara/pomyu.chp --no-loop --2p
//! cargo run -p chp-host -- check chara/pomyu.chp
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{Level, warn};

use chp_host::{AppConfig, CharaSession};
use chp_runtime::{AnimeState, DiagnosticLevel, EntryKind};

#[derive(Parser)]
#[command(name = "chp-host")]
#[command(about = "CHP 角色查看器（命令行）")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径（默认：config.json）
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 显示角色信息、各状态帧表与诊断
    Info {
        /// CHP 文件路径
        file: PathBuf,
    },

    /// 以 JSON 输出指定时刻的绘制列表
    Frame {
        /// CHP 文件路径
        file: PathBuf,

        /// 动画状态编号（1-18，默认取配置）
        #[arg(short, long)]
        state: Option<i64>,

        /// 经过的毫秒数
        #[arg(short, long, default_value = "0")]
        time: u64,

        /// 忽略 #Loop
        #[arg(long)]
        no_loop: bool,

        /// 使用 2P 配色位图
        #[arg(long = "2p")]
        player2: bool,
    },

    /// 检查 CHP 文件，有错误时以非零状态退出
    Check {
        /// CHP 文件路径
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let loaded = AppConfig::try_load(&cli.config);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&config, cli.verbose);
    if let Err(e) = &loaded {
        warn!(error = %e, "配置文件无效，使用默认配置");
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, config) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(config: &AppConfig, verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else {
        config.log_level().unwrap_or(Level::INFO)
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, config: AppConfig) -> Result<()> {
    let mut session = CharaSession::new(config);

    match command {
        Commands::Info { file } => {
            load(&mut session, &file)?;
            print_info(&session);
        }
        Commands::Frame {
            file,
            state,
            time,
            no_loop,
            player2,
        } => {
            load(&mut session, &file)?;

            if let Some(number) = state {
                let state = AnimeState::from_number(number)
                    .with_context(|| format!("动画状态编号 {number} 超出范围（1-18）"))?;
                session.select(state);
            }

            let context = session.context_mut();
            context.loop_enabled &= !no_loop;
            context.use_2p_palette |= player2;

            let output = session.tick(time);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Check { file } => {
            load(&mut session, &file)?;
            check(&session)?;
        }
    }

    Ok(())
}

fn load(session: &mut CharaSession, file: &Path) -> Result<()> {
    session
        .reload(file)
        .with_context(|| format!("无法加载 {}", file.display()))
}

fn print_info(session: &CharaSession) {
    let Some(chara) = session.chara() else {
        return;
    };
    let info = &chara.info;

    println!("名称:     {}", info.name.as_deref().unwrap_or("-"));
    println!("作者:     {}", info.artist.as_deref().unwrap_or("-"));
    if info.legacy {
        println!("格式:     旧格式（10 进制，颜色键）");
    } else {
        println!("格式:     #Data {}", info.data);
    }
    println!(
        "矩形表:   {} / {} 已定义",
        chara.atlas.defined_count(),
        chara.atlas.len()
    );
    let (w, h) = chara.box_size();
    println!("包围盒:   {}x{}", w, h);
    println!("默认帧长: {} ms", chara.default_frame_ms());

    println!();
    println!("位图:");
    for bitmap in session.bitmaps() {
        match bitmap.size {
            Some((w, h)) => println!("  ✅ #{:<12} {} ({}x{})", bitmap.slot.directive(), bitmap.path, w, h),
            None => println!("  ❌ #{:<12} {}", bitmap.slot.directive(), bitmap.path),
        }
    }

    println!();
    println!(
        "{:<24} {:>6} {:>6} {:>6} {:>8} {:>8} {:>6}",
        "状态", "帧长", "循环", "帧数", "Pattern", "Texture", "Layer"
    );
    for (state, anim) in chara.states().filter(|(_, s)| s.loaded) {
        println!(
            "{:<24} {:>6} {:>6} {:>6} {:>8} {:>8} {:>6}",
            state.to_string(),
            anim.effective_frame_ms(chara.default_frame_ms()),
            anim.loop_frame,
            anim.frame_count,
            anim.entries(EntryKind::Pattern).len(),
            anim.entries(EntryKind::Texture).len(),
            anim.entries(EntryKind::Layer).len(),
        );
    }

    let diagnostics = session.diagnostics();
    if !diagnostics.is_empty() {
        println!();
        println!("诊断（{} 条）:", diagnostics.len());
        for diagnostic in diagnostics {
            println!("{}", diagnostic);
        }
    }
}

fn check(session: &CharaSession) -> Result<()> {
    let diagnostics = session.diagnostics();
    for diagnostic in diagnostics {
        println!("{}", diagnostic);
    }

    let missing: Vec<_> = session.bitmaps().iter().filter(|b| !b.loaded()).collect();
    for bitmap in &missing {
        println!("[WARN] 位图无法加载: #{} {}", bitmap.slot.directive(), bitmap.path);
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Error)
        .count();
    let warns = diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Warn)
        .count()
        + missing.len();

    if errors > 0 {
        bail!("检查失败：{} 个错误，{} 个警告", errors, warns);
    }

    println!("✅ 检查通过（{} 个警告）", warns);
    Ok(())
}
