//! # Eval Host
//!
//! 括号 AST 程序的命令行宿主：读取源文本，构建语法树并求值。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p host-cli -- program.ast
//! cargo run -p host-cli -- program.ast --tokens --tree
//! cat program.ast | cargo run -p host-cli -- --no-eval -vv
//! cargo run -p host-cli -- program.ast --config eval.json
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use eval_core::{
    Diagnostic, DiagnosticResult, EvalConfig, TraceEvaluator, analyze_tree, build_tree_with_config,
    tokenize,
};
use tracing::{Level, debug, info};

#[derive(Parser)]
#[command(name = "eval-host")]
#[command(about = "括号 AST 程序宿主 - 构建语法树并按后序求值")]
#[command(version)]
struct Cli {
    /// 源文件（缺省时从标准输入读取）
    input: Option<PathBuf>,

    /// JSON 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志详细程度（-v debug，-vv trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// 打印 token 序列
    #[arg(long)]
    tokens: bool,

    /// 打印构建完成的语法树
    #[arg(long)]
    tree: bool,

    /// 只建树，不求值
    #[arg(long)]
    no_eval: bool,

    /// setup 失败时直接报错，不做局部恢复
    #[arg(long)]
    no_recover: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(diagnostics) if diagnostics.has_errors() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("错误: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<DiagnosticResult> {
    let mut config = match &cli.config {
        Some(path) => EvalConfig::load(path)?,
        None => EvalConfig::default(),
    };
    if cli.no_recover {
        config.recover = false;
    }
    if cli.no_eval {
        config.evaluate = false;
    }
    init_logging(&config, cli.verbose);
    debug!(?config, "配置已加载");

    let (source_id, source) = read_source(cli.input.as_deref())?;

    let tokens = match tokenize(&source) {
        Ok(tokens) => tokens,
        Err(e) => return Ok(report_fatal(&source_id, format!("分词失败: {}", e))),
    };
    if cli.tokens {
        let line: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        println!("{}", line.join(" "));
    }

    let mut built = match build_tree_with_config(&source_id, tokens, &config) {
        Ok(built) => built,
        Err(e) => return Ok(report_fatal(&source_id, format!("建树失败: {}", e))),
    };
    if cli.tree {
        println!("{}", built.ast.print(built.ast.root()));
    }

    let mut diagnostics = built.diagnostics.clone();
    diagnostics.merge(analyze_tree(&source_id, &built.ast));
    for diag in &diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    if config.evaluate {
        let mut trace = TraceEvaluator::new();
        built
            .evaluate(&mut trace)
            .with_context(|| format!("求值失败: {}", source_id))?;
        info!(nodes = trace.trace.len(), "求值完成");
        for label in &trace.trace {
            println!("{}", label);
        }
    }

    Ok(diagnostics)
}

/// 无法建树时只输出一条 Error 诊断，由 `main` 转成失败退出码
fn report_fatal(source_id: &str, message: String) -> DiagnosticResult {
    let mut diagnostics = DiagnosticResult::new();
    diagnostics.push(Diagnostic::error(source_id, message));
    for diag in &diagnostics.diagnostics {
        eprintln!("{}", diag);
    }
    diagnostics
}

/// 命令行的 `-v` 优先于配置文件中的 `log_level`
fn init_logging(config: &EvalConfig, verbose: u8) {
    let level = match verbose {
        0 => config.log_level.parse().unwrap_or(Level::INFO),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn read_source(input: Option<&Path>) -> Result<(String, String)> {
    match input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("无法读取源文件: {}", path.display()))?;
            let source_id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok((source_id, source))
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("无法读取标准输入")?;
            Ok(("stdin".to_string(), source))
        }
    }
}
