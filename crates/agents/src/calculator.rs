//! Calculator - computes profit from the figures in the request

use crate::specialist::{failure, Specialist};
use crate::{AgentError, Result};
use agentflow_core::{ConversationState, Message, Task};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument, warn};

static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$\s?(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d+))?\s*(thousand|million|billion|k|m|b)?\b")
        .expect("amount pattern is valid")
});

static REVENUE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(revenues?|rev|sales|income)\b").expect("revenue pattern is valid")
});

static COST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(costs?|expenses?|spend)\b").expect("cost pattern is valid")
});

/// Revenue and cost pulled out of a request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Figures {
    pub revenue: f64,
    pub cost: f64,
}

impl Figures {
    pub fn profit(&self) -> f64 {
        self.revenue - self.cost
    }
}

#[derive(Debug, Default)]
pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Specialist for Calculator {
    fn task(&self) -> Task {
        Task::Calculate
    }

    #[instrument(skip(self, state))]
    async fn run(&self, state: &ConversationState) -> Message {
        let request = state.latest_request().unwrap_or_default();

        match extract_figures(request) {
            Ok(figures) => {
                let profit = figures.profit();
                info!("Calculated profit {} from {:?}", profit, figures);
                Message::task_done(
                    Task::Calculate,
                    format!(
                        "Calculated profit: Revenue {} - Cost {} = Profit {}",
                        format_money(figures.revenue),
                        format_money(figures.cost),
                        format_money(profit)
                    ),
                )
            }
            Err(e) => {
                warn!("Calculation failed: {}", e);
                failure(Task::Calculate, &e)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy)]
struct Amount {
    span: Span,
    value: f64,
}

/// Find revenue and cost in free text such as
/// "$1,000,000 revenue / $700,000 cost" or "if revenue $500k and cost $350k".
///
/// When the first amount precedes the first keyword, each keyword takes the
/// nearest amount before it; otherwise the nearest amount after it.
pub fn extract_figures(text: &str) -> Result<Figures> {
    let amounts: Vec<Amount> = AMOUNT_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let value = parse_amount(
                caps.get(1)?.as_str(),
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
            )?;
            Some(Amount {
                span: Span { start: whole.start(), end: whole.end() },
                value,
            })
        })
        .collect();

    if amounts.is_empty() {
        return Err(AgentError::Capability("no dollar amounts in request".into()));
    }

    let revenue_kw: Vec<Span> = keyword_spans(&REVENUE_PATTERN, text);
    let cost_kw: Vec<Span> = keyword_spans(&COST_PATTERN, text);

    let first_keyword = revenue_kw.iter().chain(cost_kw.iter()).map(|s| s.start).min();
    let amounts_lead = match first_keyword {
        Some(kw) => amounts[0].span.start < kw,
        None => true,
    };

    let revenue = revenue_kw
        .iter()
        .find_map(|kw| nearest(&amounts, *kw, amounts_lead, None))
        .ok_or_else(|| AgentError::Capability("no revenue figure in request".into()))?;

    let cost = cost_kw
        .iter()
        .find_map(|kw| nearest(&amounts, *kw, amounts_lead, Some(revenue)))
        .ok_or_else(|| AgentError::Capability("no cost figure in request".into()))?;

    Ok(Figures {
        revenue: amounts[revenue].value,
        cost: amounts[cost].value,
    })
}

fn keyword_spans(pattern: &Regex, text: &str) -> Vec<Span> {
    pattern
        .find_iter(text)
        .map(|m| Span { start: m.start(), end: m.end() })
        .collect()
}

/// Index of the amount closest to `keyword`, preferring the side the text uses
fn nearest(amounts: &[Amount], keyword: Span, amounts_lead: bool, exclude: Option<usize>) -> Option<usize> {
    let candidates = || {
        amounts
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != exclude)
    };

    let preferred = candidates()
        .filter(|(_, a)| {
            if amounts_lead {
                a.span.end <= keyword.start
            } else {
                a.span.start >= keyword.end
            }
        })
        .min_by_key(|(_, a)| distance(a.span, keyword))
        .map(|(i, _)| i);

    preferred.or_else(|| {
        candidates()
            .min_by_key(|(_, a)| distance(a.span, keyword))
            .map(|(i, _)| i)
    })
}

fn distance(a: Span, b: Span) -> usize {
    if a.end <= b.start {
        b.start - a.end
    } else if b.end <= a.start {
        a.start - b.end
    } else {
        0
    }
}

fn parse_amount(integer: &str, fraction: Option<&str>, scale: Option<&str>) -> Option<f64> {
    let mut number = integer.replace(',', "");
    if let Some(fraction) = fraction {
        number.push('.');
        number.push_str(fraction);
    }
    let value: f64 = number.parse().ok()?;

    let multiplier = match scale.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("k") | Some("thousand") => 1_000.0,
        Some("m") | Some("million") => 1_000_000.0,
        Some("b") | Some("billion") => 1_000_000_000.0,
        _ => 1.0,
    };
    Some(value * multiplier)
}

/// `$1,234,567` for whole amounts, `$1,234.50` otherwise
pub fn format_money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as u128;
    let whole = group_thousands(cents / 100);
    match cents % 100 {
        0 => format!("{}${}", sign, whole),
        c => format!("{}${}.{:02}", sign, whole, c),
    }
}

fn group_thousands(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
