use std::process::ExitCode;

fn main() -> ExitCode {
    match canvaswork::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            canvaswork::ui::output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
