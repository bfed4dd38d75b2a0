//! Diagram Studio command-line entry point.

use diagramstudio_cli::{CliOptions, Command, parse_options, run, usage_text};

fn main() {
    env_logger::init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "diagramstudio".to_owned());

    let options: CliOptions = match parse_options(args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("{}", usage_text(&program));
            std::process::exit(2);
        }
    };

    if options.command == Command::Help {
        println!("{}", usage_text(&program));
        return;
    }

    let stdout = std::io::stdout();
    if let Err(e) = run(&options, &mut stdout.lock()) {
        log::error!("{:?}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
