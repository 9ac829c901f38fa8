//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `ast-check`: 检查 `.ast` 程序文件（分词、建树、顶层语句）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use eval_core::{Diagnostic, DiagnosticResult, EvalConfig, check_source};
use walkdir::WalkDir;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "ast-check" => {
            let path = args.next();
            ast_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  ast-check       检查 .ast 程序文件

AST-CHECK:
  cargo xtask ast-check [path]

  不带参数：检查 programs/ 下所有 .ast 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - 分词错误
    - 括号不匹配等致命建树错误
    - 建树时已恢复的错误
    - 求值时会被跳过的顶层语句
"#
    );
}

//=============================================================================
// ast-check 命令实现
//=============================================================================

/// 默认的程序目录（相对于 workspace root）
const DEFAULT_PROGRAM_DIR: &str = "programs";

/// 检查结果
#[derive(Default)]
struct AstCheckResult {
    /// 检查的文件数量
    files_checked: usize,
    /// 诊断结果（无法读取或无法建树的文件记为 Error）
    diagnostics: DiagnosticResult,
}

/// 执行程序检查
fn ast_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_program_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_PROGRAM_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认程序目录不存在: {}\n请在 workspace 根目录运行，或指定文件路径",
                    dir.display()
                );
            }
            collect_program_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到程序文件（.ast）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个程序文件...\n", files.len());

    let config = EvalConfig::default();
    let mut result = AstCheckResult::default();
    for file in &files {
        check_program_file(file, &config, &mut result);
    }

    print_check_result(&result);

    if result.diagnostics.has_errors() {
        anyhow::bail!("程序检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有 `.ast` 文件
fn collect_program_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "ast"))
        .collect();
    files.sort();
    files
}

/// 检查单个程序文件
fn check_program_file(file: &Path, config: &EvalConfig, result: &mut AstCheckResult) {
    let source_id = file.display().to_string();
    result.files_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            result
                .diagnostics
                .push(Diagnostic::error(&source_id, format!("无法读取文件 - {}", e)));
            return;
        }
    };

    result.diagnostics.merge(check_source(&source_id, &content, config));
}

/// 输出检查结果
fn print_check_result(result: &AstCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个文件", result.files_checked);
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    let error_count = result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
