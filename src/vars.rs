macro_rules! env_config {
    ($name:ident, $env_key:expr, $default:expr) => {
        paste::paste! {
            pub static [<JANITOR_ $name>]: ::std::sync::LazyLock<&'static str> = ::std::sync::LazyLock::new(|| {
                ::std::boxed::Box::leak(
                    ::std::env::var($env_key)
                        .unwrap_or_else(|_| $default.to_string())
                        .into_boxed_str()
                )
            });
        }
    };
    ($name:ident, $default:expr) => {
        paste::paste! {
            env_config!($name, stringify!([<JANITOR_ $name>]), $default);
        }
    };
}

env_config!(TTL_MINUTES, "10");
env_config!(INTERVAL_SECS, "300");
env_config!(OUTPUT_DIRS, "/workspace/ComfyUI/output");
env_config!(PATTERNS, "*.mp4,*.webm,*.mkv,*.mov");
env_config!(LOG_FILE, "/workspace/comfy-janitor.log");
env_config!(RECURSIVE, "true");
env_config!(LOCK_FILE, "/tmp/comfy-janitor.pid");
