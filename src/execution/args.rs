//! Argument lists for each subcommand.
//!
//! Plan, apply and destroy share a common tail built from the options
//! (parallelism, vars, var files, targets, color, locking). Init only takes
//! backend and upgrade flags. Read-only commands take almost nothing.

use crate::core::options::Options;

/// Arguments for `init`.
pub fn init(options: &Options) -> Vec<String> {
    let mut args = vec!["init".to_string(), format!("-upgrade={}", options.upgrade())];
    if options.reconfigure() {
        args.push("-reconfigure".to_string());
    }
    if !options.backend() {
        args.push("-backend=false".to_string());
    }
    for (key, value) in options.backend_config() {
        args.push(format!("-backend-config={}={}", key, value));
    }
    if options.no_color() {
        args.push("-no-color".to_string());
    }
    args
}

/// Arguments for `plan`, writing the plan file when one is configured.
pub fn plan(options: &Options) -> Vec<String> {
    let mut args = vec!["plan".to_string(), "-input=false".to_string()];
    args.extend(common(options));
    if let Some(path) = options.plan_file() {
        args.push(format!("-out={}", path.display()));
    }
    args
}

/// Arguments for `plan -detailed-exitcode`.
pub fn plan_detailed(options: &Options) -> Vec<String> {
    let mut args = vec![
        "plan".to_string(),
        "-input=false".to_string(),
        "-detailed-exitcode".to_string(),
    ];
    args.extend(common(options));
    args
}

/// Arguments for `apply`. A saved plan already carries vars and targets, so
/// only the plan file is passed in that case.
pub fn apply(options: &Options) -> Vec<String> {
    let mut args = vec![
        "apply".to_string(),
        "-input=false".to_string(),
        "-auto-approve".to_string(),
    ];
    match options.plan_file() {
        Some(path) => {
            if options.no_color() {
                args.push("-no-color".to_string());
            }
            args.push(path.display().to_string());
        }
        None => args.extend(common(options)),
    }
    args
}

/// Arguments for `destroy`.
pub fn destroy(options: &Options) -> Vec<String> {
    let mut args = vec![
        "destroy".to_string(),
        "-auto-approve".to_string(),
        "-input=false".to_string(),
    ];
    args.extend(common(options));
    args
}

/// Arguments for `validate`.
pub fn validate(options: &Options) -> Vec<String> {
    let mut args = vec!["validate".to_string()];
    if options.no_color() {
        args.push("-no-color".to_string());
    }
    args
}

/// Arguments for `fmt -check -recursive`.
pub fn fmt_check() -> Vec<String> {
    vec![
        "fmt".to_string(),
        "-check".to_string(),
        "-recursive".to_string(),
    ]
}

/// Arguments for reading a single output as a raw string.
pub fn output_raw(name: &str) -> Vec<String> {
    vec![
        "output".to_string(),
        "-no-color".to_string(),
        "-raw".to_string(),
        name.to_string(),
    ]
}

/// Arguments for reading all outputs as JSON.
pub fn output_json() -> Vec<String> {
    vec![
        "output".to_string(),
        "-no-color".to_string(),
        "-json".to_string(),
    ]
}

fn common(options: &Options) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(n) = options.parallelism() {
        args.push(format!("-parallelism={}", n));
    }
    args.extend(options.vars().to_args());
    for file in options.var_files() {
        args.push(format!("-var-file={}", file.display()));
    }
    for target in options.targets() {
        args.push(format!("-target={}", target));
    }
    if options.no_color() {
        args.push("-no-color".to_string());
    }
    args.push(format!("-lock={}", options.lock()));
    if let Some(timeout) = options.lock_timeout() {
        args.push(format!("-lock-timeout={}", timeout));
    }
    args
}
