//! Console keypad — drives the calculator from stdin and shows the persona's verdict.
//! Tokens: digits, `.`, `+ - * / × ÷`, `=`, `c`, `ce`, `back`, `history`, `quit`.
//! Run with gateway up: cargo run --bin snarkulator-console

use reqwest::Client;
use snarkulator_core::{
    format_number, CalculateRequest, CalculateResponse, Calculation, CalculatorState, ErrorBody,
    Operator, Session,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

enum Key {
    Digits(String),
    Decimal,
    Op(Operator),
    Equals,
    Clear,
    ClearEntry,
    Backspace,
    History,
    Quit,
}

fn parse_key(token: &str) -> Option<Key> {
    match token.to_ascii_lowercase().as_str() {
        "=" => Some(Key::Equals),
        "." => Some(Key::Decimal),
        "c" => Some(Key::Clear),
        "ce" => Some(Key::ClearEntry),
        "back" | "<" => Some(Key::Backspace),
        "history" | "h" => Some(Key::History),
        "quit" | "q" | "exit" => Some(Key::Quit),
        t if !t.is_empty() && t.chars().all(|c| c.is_ascii_digit() || c == '.') => {
            Some(Key::Digits(t.to_string()))
        }
        t => t.parse::<Operator>().ok().map(Key::Op),
    }
}

#[tokio::main]
async fn main() {
    let base_url = std::env::var("SNARKULATOR_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let client = Client::new();
    let mut calc = CalculatorState::new();
    let mut session = Session::new();

    println!("[SNARKULATOR] Console keypad → {}", base_url);
    println!("{}", session.render());
    println!("> {}", calc.display);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        for token in line.split_whitespace() {
            let Some(key) = parse_key(token) else {
                println!("  ? unknown key: {}", token);
                continue;
            };
            match key {
                Key::Digits(d) => d.chars().for_each(|c| {
                    if c == '.' {
                        calc.input_decimal()
                    } else {
                        calc.input_digit(c)
                    }
                }),
                Key::Decimal => calc.input_decimal(),
                Key::Op(op) => calc.perform_operation(op),
                Key::Clear => calc.clear(),
                Key::ClearEntry => calc.clear_entry(),
                Key::Backspace => calc.backspace(),
                Key::Equals => {
                    let expression = calc.expression();
                    let Some(value) = calc.perform_calculation() else {
                        continue;
                    };
                    println!("  {} = {} (locally)", expression, format_number(value));
                    submit(&client, &base_url, &mut session, expression, format_number(value))
                        .await;
                    println!("{}", session.render());
                }
                Key::History => show_history(&client, &base_url).await,
                Key::Quit => return,
            }
        }
        println!("> {}", calc.expression());
    }
}

async fn submit(
    client: &Client,
    base_url: &str,
    session: &mut Session,
    expression: String,
    result: String,
) {
    session.begin_request();
    println!("  \"{}\"", session.speech_bubble.as_deref().unwrap_or_default());

    let body = CalculateRequest {
        expression: Some(expression),
        result: Some(result),
    };
    let res = client
        .post(format!("{}/api/calculate", base_url))
        .json(&body)
        .send()
        .await;

    match res {
        Ok(r) if r.status().is_success() => match r.json::<CalculateResponse>().await {
            Ok(reply) => {
                println!("  AI says: {}", reply.calculation.result);
                session.apply(&reply);
            }
            Err(e) => {
                eprintln!("  reply unreadable: {}", e);
                session.fail();
            }
        },
        Ok(r) => {
            let status = r.status();
            let message = r
                .json::<ErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_else(|_| status.to_string());
            eprintln!("  gateway {}: {}", status, message);
            session.fail();
        }
        Err(e) => {
            eprintln!("  gateway unreachable: {}", e);
            session.fail();
        }
    }
}

async fn show_history(client: &Client, base_url: &str) {
    let res = client
        .get(format!("{}/api/calculations?limit=10", base_url))
        .send()
        .await;
    match res {
        Ok(r) => match r.json::<Vec<Calculation>>().await {
            Ok(list) if list.is_empty() => println!("  (no calculations yet)"),
            Ok(list) => {
                for c in list {
                    println!("  {}  {} = {}", c.timestamp.format("%H:%M:%S"), c.expression, c.result);
                }
            }
            Err(e) => eprintln!("  history unreadable: {}", e),
        },
        Err(e) => eprintln!("  gateway unreachable: {}", e),
    }
}
