// Alert message rendering

use std::fmt::Write;

use crate::clients::notifier::ActionLink;
use crate::core::types::{ExitLevels, IndicatorSnapshot, TrendLabel, TrendResult};

#[derive(Debug, Clone)]
pub struct TrendAlert {
    pub instrument: String,
    pub trend: TrendResult,
    pub exits: ExitLevels,
    pub snapshots: Vec<IndicatorSnapshot>,
}

impl TrendAlert {
    /// HTML-flavoured text for the notifier.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let headline = match self.trend.label {
            TrendLabel::StrongBullish => "🚀 STRONG BULLISH",
            TrendLabel::Bullish => "📈 BULLISH",
            TrendLabel::Neutral => "⏸ NEUTRAL",
            TrendLabel::Bearish => "📉 BEARISH",
            TrendLabel::StrongBearish => "🔻 STRONG BEARISH",
        };

        let _ = writeln!(out, "<b>{} {}</b>", headline, escape_html(&self.instrument));
        let _ = writeln!(out, "Confidence: {:.1}%", self.trend.confidence_percent);
        let _ = writeln!(out);
        let _ = writeln!(out, "Entry: {}", format_price(self.exits.entry));
        let _ = writeln!(
            out,
            "Take profit (+{:.1}%): {}",
            self.trend.suggested_profit_percent,
            format_price(self.exits.take_profit)
        );
        let _ = writeln!(out, "Stop loss: {}", format_price(self.exits.stop_loss));
        let _ = writeln!(out, "Trailing stop: {}", format_price(self.exits.trailing_stop));
        let _ = writeln!(out, "R:R target: {}", format_price(self.exits.reward_target));
        let _ = writeln!(out, "ATR: {}", format_price(self.exits.atr_value));

        if !self.snapshots.is_empty() {
            let _ = writeln!(out);
            for snap in &self.snapshots {
                let _ = writeln!(
                    out,
                    "{}: RSI {:.1} | MACD hist {:+.4} | %K {:.1}",
                    snap.resolution, snap.rsi, snap.macd.histogram, snap.stochastic.k
                );
            }
        }

        out.trim_end().to_string()
    }
}

/// Links attached to every alert. The template's `{instrument}` is replaced.
pub fn chart_links(template: &str, instrument: &str) -> Vec<ActionLink> {
    if template.is_empty() {
        return Vec::new();
    }
    vec![ActionLink::new("📊 Chart", template.replace("{instrument}", instrument))]
}

/// Precision scaled to the magnitude so sub-cent assets stay readable.
pub fn format_price(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1000.0 {
        format!("{:.2}", value)
    } else if magnitude >= 1.0 {
        format!("{:.4}", value)
    } else {
        format!("{:.8}", value)
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
