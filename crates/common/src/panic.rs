use once_cell::sync::{Lazy, OnceCell};
use std::panic;

type PanicCallback = dyn Fn(&panic::PanicHookInfo<'_>) + Sync + Send + 'static;
static DEFAULT_PANIC_HOOK: Lazy<Box<PanicCallback>> = Lazy::new(|| {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(report_ice));
    hook
});

/// The model files the process is working on, named in the bug report.
static MODEL_FILES: OnceCell<String> = OnceCell::new();

pub fn install_panic_hook() {
    Lazy::force(&DEFAULT_PANIC_HOOK);
}

/// Records which model the process handles. Only the first call counts.
pub fn set_model_files(files: impl Into<String>) {
    let _ = MODEL_FILES.set(files.into());
}

fn report_ice(info: &panic::PanicHookInfo) {
    (*DEFAULT_PANIC_HOOK)(info);
    eprint!("{}", ice_message(MODEL_FILES.get().map(String::as_str)));
}

fn ice_message(model_files: Option<&str>) -> String {
    let mut message = format!(
        "\nYou've hit an internal error in dtree {}. This is a bug in dtree, not in your model files.\n",
        env!("CARGO_PKG_VERSION")
    );
    match model_files {
        Some(files) => message.push_str(&format!(
            "\nIf you would, please report it along with {files}, which triggered it.\n"
        )),
        None => message.push_str("\nIf you would, please report it along with the command you ran.\n"),
    }
    message
}
