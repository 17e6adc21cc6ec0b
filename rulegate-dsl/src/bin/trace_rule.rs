/// Rule Expression Tracer - Shows the flow through Lexer → Parser → Evaluator
///
/// Usage: cargo run --bin trace_rule -- <expression> [after.json] [before.json]
///
/// Set RUST_LOG=rulegate_dsl=trace to see engine logging.
use rulegate_dsl::{
    evaluate_parsed, parse, pretty_print, EvaluateOptions, EvaluationContext, Lexer,
};
use std::fs;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin trace_rule -- <expression> [after.json] [before.json]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin trace_rule -- \"amount >= 50000 and changed('status')\" after.json before.json");
        std::process::exit(1);
    }

    let source = &args[1];

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ RULE EXPRESSION TRACER");
    println!("╚═══════════════════════════════════════════════════════════════\n");

    println!("📝 INPUT EXPRESSION:");
    println!("{}", source);
    println!();

    // Step 1: Tokens
    println!("🔤 STEP 1: TOKENS");
    match Lexer::new(source).tokenize() {
        Ok(tokens) => {
            for token in &tokens {
                println!(
                    "  {:>3}:{:<3} {}",
                    token.span.line, token.span.column, token.kind
                );
            }
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
    println!();

    // Step 2: AST
    let parsed = match parse(source) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    println!("🌳 STEP 2: AST");
    match serde_json::to_string_pretty(&parsed.ast) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("{:#?} (json failed: {})", parsed.ast, e),
    }
    println!();
    println!("  identifiers: {:?}", parsed.identifiers);
    println!("  functions:   {:?}", parsed.functions);
    println!("  canonical:   {}", pretty_print(&parsed.ast));
    println!();

    // Step 3: Evaluation (only when snapshots were given)
    let Some(after_path) = args.get(2) else {
        println!("ℹ️  No snapshots given, skipping evaluation.");
        return;
    };

    let after = read_json(after_path);
    let before = args.get(3).map(|p| read_json(p));

    let context = match EvaluationContext::from_json(before, after) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    println!("⚖️  STEP 3: EVALUATION");
    match evaluate_parsed(&parsed, &context, &EvaluateOptions::new()) {
        Ok(result) => println!("  result: {}", result),
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

fn read_json(path: &str) -> serde_json::Value {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("❌ Invalid JSON in {}: {}", path, e);
            std::process::exit(1);
        }
    }
}
