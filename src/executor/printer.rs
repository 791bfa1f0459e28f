use colored::{Color, Colorize};
use serde_json::Value;

use crate::environment::Environment;

use super::{
    error::ExecutionError,
    models::{ExecutionResult, ResponseFraming},
};

pub fn print_execution_result(result: &ExecutionResult, environment: &Environment, pretty: bool) {
    let status_color = if result.status >= 400 {
        Color::Red
    } else if result.status >= 300 {
        Color::Yellow
    } else {
        Color::Green
    };

    println!(
        "{} {} {}",
        "POST".bold(),
        environment.url.cyan(),
        format!("[{}]", environment.name).dimmed()
    );
    println!(
        "{} {} {}",
        "Status:".bold(),
        format!("{}", result.status).color(status_color),
        format!("({:.1} ms)", result.duration_ms).dimmed()
    );

    if result.framing == ResponseFraming::Text {
        println!("{}", "Response was not JSON; wrapped as data".yellow());
    }

    let errors = result.errors();
    if result.has_errors() {
        println!("{} {}", "GraphQL errors:".bold().red(), errors.len());
        for error in &errors {
            println!("  {} {}", "-".red(), error);
        }
    }

    println!("{}", "Response".bold());
    println!("{}", format_payload(&result.payload, pretty));
}

pub fn print_execution_error(err: &ExecutionError) {
    eprintln!("{} {}", "Request failed:".bold().red(), err);
}

pub fn format_payload(payload: &Value, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(payload)
    } else {
        serde_json::to_string(payload)
    };
    rendered.unwrap_or_else(|_| payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Auth;
    use serde_json::json;

    fn environment() -> Environment {
        Environment {
            id: "env".to_string(),
            name: "Local".to_string(),
            url: "http://localhost:4000/graphql".to_string(),
            auth: Auth::None,
        }
    }

    #[test]
    fn format_payload_respects_pretty_flag() {
        let payload = json!({"data": {"x": 1}});
        assert_eq!(format_payload(&payload, false), r#"{"data":{"x":1}}"#);
        assert_eq!(
            format_payload(&payload, true),
            "{\n  \"data\": {\n    \"x\": 1\n  }\n}"
        );
    }

    #[test]
    fn print_execution_result_handles_success() {
        let result = ExecutionResult {
            status: 200,
            duration_ms: 12.5,
            framing: ResponseFraming::Json,
            payload: json!({"data": {"ok": true}}),
        };
        print_execution_result(&result, &environment(), true);
    }

    #[test]
    fn print_execution_result_handles_graphql_errors() {
        let result = ExecutionResult {
            status: 200,
            duration_ms: 4.0,
            framing: ResponseFraming::Json,
            payload: json!({"errors": [{"message": "bad field"}]}),
        };
        print_execution_result(&result, &environment(), false);
    }

    #[test]
    fn print_execution_error_handles_transport_failures() {
        print_execution_error(&ExecutionError::HttpStatus {
            status: 502,
            body: "Bad Gateway".to_string(),
        });
    }
}
