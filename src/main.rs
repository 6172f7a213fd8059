use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    no_audio: bool,
    dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;

    playdeck::app::run_with_startup(playdeck::app::AppStartupOptions {
        no_audio: args.no_audio,
        start_dir: args.dir,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--no-audio" => out.no_audio = true,
            "--dir" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--dir requires a path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--dir cannot be empty");
                }
                out.dir = Some(PathBuf::from(value.trim()));
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("PlayDeck");
    println!("  --no-audio     Run with the silent engine (no output device)");
    println!("  --dir <path>   Start the file picker in <path>");
}
