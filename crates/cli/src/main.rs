use std::process::ExitCode;

fn main() -> ExitCode {
    salesight_cli::run()
}
