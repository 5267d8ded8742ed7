//! Options read from the environment once at startup.
//!
//! | Variable | Values | Effect |
//! |---|---|---|
//! | `SIM86_TRACE` | `1`/`true`, `0`/`false` | Trace register and flag changes on stderr |
//! | `SIM86_MAX_STEPS` | positive integer | Step limit when `--max-steps` is not given |

use std::cell::Cell;

use miette::{miette, Report, Severity};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Env {
    trace_enabled: bool,
    max_steps: Option<u64>,
}

thread_local! {
    /// Written once by `init`
    static ENV: Cell<Option<Env>> = const { Cell::new(None) };
}

/// Read and validate environment options. Must be called once, before any accessor.
pub fn init() -> miette::Result<()> {
    let env = Env::from_vars(|name| std::env::var(name).ok())?;
    ENV.with(|cell| {
        assert!(
            cell.get().is_none(),
            "tried to initialize environment state multiple times"
        );
        cell.set(Some(env));
    });
    Ok(())
}

/// Whether to print register and flag changes after each instruction.
pub fn is_trace_enabled() -> bool {
    current().trace_enabled
}

/// Step limit applied when none is given on the command line.
pub fn max_steps() -> Option<u64> {
    current().max_steps
}

fn current() -> Env {
    ENV.with(Cell::get)
        .unwrap_or_else(|| panic!("tried to access environment state before initialization"))
}

impl Env {
    fn from_vars<F>(lookup: F) -> Result<Self, Report>
    where
        F: Fn(&str) -> Option<String>,
    {
        let trace_enabled = match lookup("SIM86_TRACE").as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => return Err(invalid("SIM86_TRACE", other, "expected `1` or `0`")),
        };
        let max_steps = match lookup("SIM86_MAX_STEPS").as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => match value.parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(invalid(
                        "SIM86_MAX_STEPS",
                        value,
                        "expected a positive step count",
                    ))
                }
                Ok(steps) => Some(steps),
            },
        };
        Ok(Env {
            trace_enabled,
            max_steps,
        })
    }
}

fn invalid(name: &str, value: &str, help: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "env::invalid",
        help = help.to_string(),
        "Invalid value `{value}` for {name}",
    )
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(vars: &[(&str, &str)]) -> Result<Env, Report> {
        Env::from_vars(|name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        })
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(parse(&[]).unwrap(), Env::default());
    }

    #[test]
    fn trace_values() {
        #[rustfmt::skip]
        let cases = [
            ("1", true), ("true", true), (" 1 ", true),
            ("0", false), ("false", false), ("", false),
        ];
        for (value, expected) in cases {
            let env = parse(&[("SIM86_TRACE", value)]).unwrap();
            assert_eq!(env.trace_enabled, expected, "SIM86_TRACE={value:?}");
        }
        assert!(parse(&[("SIM86_TRACE", "yes")]).is_err());
    }

    #[test]
    fn max_steps_values() {
        let env = parse(&[("SIM86_MAX_STEPS", "250")]).unwrap();
        assert_eq!(env.max_steps, Some(250));
        for bad in ["0", "-3", "many"] {
            let err = parse(&[("SIM86_MAX_STEPS", bad)]).unwrap_err();
            assert!(err.to_string().contains(bad));
        }
    }

    #[test]
    fn accessors_read_initialized_state() {
        // Tests run on their own threads, so this state is not shared
        ENV.with(|cell| {
            cell.set(Some(Env {
                trace_enabled: true,
                max_steps: Some(9),
            }))
        });
        assert!(is_trace_enabled());
        assert_eq!(max_steps(), Some(9));
    }

    #[test]
    #[should_panic(expected = "before initialization")]
    fn access_before_init_panics() {
        is_trace_enabled();
    }
}
