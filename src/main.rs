use std::process::ExitCode;

fn main() -> ExitCode {
    railsync_lib::run()
}
