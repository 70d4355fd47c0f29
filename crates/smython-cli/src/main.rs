use std::{env, fs, path::Path, process::ExitCode};

use smython::Runtime;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("usage: smython <script.py>");
        return ExitCode::FAILURE;
    };

    let code = match fs::read_to_string(file_path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: cannot read {file_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut runtime = Runtime::new();
    if let Some(dir) = Path::new(file_path).parent() {
        runtime.set_module_dir(dir);
    }

    if let Err(err) = runtime.execute(&code) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }
    if let Err(err) = runtime.run_exit_callbacks() {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
