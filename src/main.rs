// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use shader_bridge::client::ShaderTranslator;
use shader_bridge::config::load_and_validate_config;
use shader_bridge::protocol::{
    InputDialect, ObjectCode, OutputDialect, ShaderStage, TranslateOptions,
};
use std::env;
use std::fs;
use tracing_subscriber::EnvFilter;

/// Bytes of binary object code shown in the hex summary.
const HEX_PREVIEW_BYTES: usize = 32;

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <config.yaml> <shader-file> <stage> [input-dialect] [output-dialect] [--reflect]",
        program
    );
    eprintln!("Example: {} configs/wasm.yaml shader.frag fragment webgl glsl330", program);
    eprintln!("Example: {} configs/process.yaml shader.vert vertex webgl2 spirv --reflect", program);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        print_usage(program_name(&args));
        std::process::exit(1);
    }

    if let Err(err) = run(&args[1..]) {
        eprintln!("❌ {:#}", err);
        std::process::exit(1);
    }
}

fn program_name(args: &[String]) -> &str {
    args.first().map_or("shader-bridge", String::as_str)
}

fn run(args: &[String]) -> anyhow::Result<()> {
    let reflect = args.iter().any(|arg| arg == "--reflect");
    let positional: Vec<&String> = args.iter().filter(|arg| *arg != "--reflect").collect();
    if positional.len() < 3 {
        bail!("expected <config.yaml> <shader-file> <stage>");
    }
    if positional.len() > 5 {
        bail!("too many arguments: {:?}", &positional[5..]);
    }

    let config_path = positional[0];
    let shader_path = positional[1];
    let stage: ShaderStage = positional[2].parse()?;
    let input_dialect: InputDialect = match positional.get(3) {
        Some(tag) => tag.parse()?,
        None => InputDialect::default(),
    };
    let output_dialect: OutputDialect = match positional.get(4) {
        Some(tag) => tag.parse()?,
        None => OutputDialect::default(),
    };

    let config = load_and_validate_config(config_path)
        .with_context(|| format!("loading {}", config_path))?;
    let source = fs::read_to_string(shader_path)
        .with_context(|| format!("reading shader {}", shader_path))?;

    let mut options = TranslateOptions::default();
    if reflect {
        options = options.with_reflection();
    }

    let mut translator = ShaderTranslator::from_config(&config)?;
    let outcome = translator.translate(&source, stage, input_dialect, output_dialect, &options);
    translator.close()?;

    // A compile error's Display already carries the info log.
    let result = outcome?;

    match &result.object_code {
        Some(ObjectCode::Text(text)) => println!("{}", text),
        Some(ObjectCode::Binary(bytes)) => {
            let preview: Vec<String> = bytes
                .iter()
                .take(HEX_PREVIEW_BYTES)
                .map(|b| format!("{:02x}", b))
                .collect();
            println!("{} bytes of {}: {}", bytes.len(), output_dialect, preview.join(" "));
        }
        None => println!("(no object code)"),
    }

    if !result.info_log.is_empty() {
        eprintln!("{}", result.info_log);
    }
    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }
    if let Some(reflection) = &result.reflection {
        println!("{}", serde_json::to_string_pretty(reflection)?);
    }

    Ok(())
}
