use clap::{Parser, Subcommand};
use jsse_core::{
    Completion, ContextRef, EngineConfig, ExecutionContext, Interpreter, JsValue, make_array_index,
    to_number,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsse-core", version, about = "Scope, object and call core of the jsse engine")]
struct Cli {
    /// Make the global context strict
    #[arg(long)]
    strict: bool,

    /// Log filter such as `debug` or `jsse_core=trace` (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify property keys as array indices
    Index { keys: Vec<String> },
    /// Run the default Array.prototype.sort over the given values
    Sort { values: Vec<String> },
    /// Shadow each name in a nested context and show what every scope resolves
    Scope { names: Vec<String> },
}

fn install_tracing(directive: Option<&str>) {
    let filter = match directive {
        Some(d) => EnvFilter::new(d),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn report_throw(interp: &mut Interpreter, ctx: &ContextRef, err: &JsValue) -> ExitCode {
    match interp.to_display_string(err, ctx) {
        Ok(text) => eprintln!("Uncaught {text}"),
        Err(_) => eprintln!("Uncaught exception"),
    }
    ExitCode::from(1)
}

fn run_index(keys: &[String]) -> ExitCode {
    for key in keys {
        match make_array_index(key) {
            Some(index) => println!("{key:?}: index {index}"),
            None => println!("{key:?}: not an index"),
        }
    }
    ExitCode::SUCCESS
}

/// Arguments that read as numbers under ToNumber become Numbers, everything
/// else stays a String.
fn sort_operand(raw: &str) -> JsValue {
    let text = JsValue::string(raw);
    match to_number(&text) {
        n if n.is_nan() || raw.trim().is_empty() => text,
        n => JsValue::Number(n),
    }
}

fn run_sort(interp: &mut Interpreter, values: &[String]) -> ExitCode {
    let ctx = interp.global_context();
    let elements = values
        .iter()
        .map(|v| sort_operand(v))
        .collect();
    let array = interp.create_array(elements);
    let sort = interp.get(&array, "sort");
    if let Completion::Throw(err) = interp.call_function(&sort, &array, &[], &ctx) {
        return report_throw(interp, &ctx, &err);
    }
    match interp.to_display_string(&array, &ctx) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => report_throw(interp, &ctx, &err),
    }
}

fn run_scope(interp: &mut Interpreter, names: &[String]) -> ExitCode {
    let global = interp.global_context();
    let nested = ExecutionContext::new(Some(global.clone()));
    for name in names {
        global.set_local(name, JsValue::string("global"));
        interp.declare_variable(&nested, name);
        if let Completion::Throw(err) = interp.assign(&nested, name, JsValue::string("nested")) {
            return report_throw(interp, &nested, &err);
        }
        let outer = interp.resolve_identifier(&global, name);
        let inner = interp.resolve_identifier(&nested, name);
        match (outer, inner) {
            (Completion::Normal(outer), Completion::Normal(inner)) => {
                println!("{name}: global={outer} nested={inner}");
            }
            (Completion::Throw(err), _) | (_, Completion::Throw(err)) => {
                return report_throw(interp, &nested, &err);
            }
        }
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    install_tracing(cli.log.as_deref());

    let mut interp = Interpreter::with_config(EngineConfig { strict: cli.strict });
    match &cli.command {
        Command::Index { keys } => run_index(keys),
        Command::Sort { values } => run_sort(&mut interp, values),
        Command::Scope { names } => run_scope(&mut interp, names),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_operands_follow_to_number() {
        assert_eq!(sort_operand("10"), JsValue::Number(10.0));
        assert_eq!(sort_operand("0x1f"), JsValue::Number(31.0));
        assert_eq!(sort_operand("Infinity"), JsValue::Number(f64::INFINITY));
        assert_eq!(sort_operand("inf"), JsValue::string("inf"));
        assert_eq!(sort_operand("NaN"), JsValue::string("NaN"));
        assert_eq!(sort_operand("nan"), JsValue::string("nan"));
        assert_eq!(sort_operand(""), JsValue::string(""));
    }
}
