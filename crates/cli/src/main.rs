use std::process::ExitCode;

fn main() -> ExitCode {
    packdeal_cli::run()
}
