//! Space-weather heuristics: escalation trend, magnetosphere impact,
//! satellite vulnerability and operator alerts.
//!
//! These are fixed formula lookups over flare classes and Kp readings, kept
//! as pure functions so both the HTTP surface and the agent tools share one
//! implementation. All of them return JSON bodies and never fail; bad input
//! yields a conservative default or an `error` field.

use chrono::Utc;
use serde_json::{json, Value};

/// Numeric intensity of a flare class string: `C` = 1, `M` = 10, `X` = 100,
/// scaled by the magnitude suffix. Unknown bands or magnitudes map to 0.
pub fn class_intensity(class: &str) -> f64 {
    let mut chars = class.chars();
    let Some(band) = chars.next() else {
        return 0.0;
    };
    let multiplier = match band.to_ascii_uppercase() {
        'C' => 1.0,
        'M' => 10.0,
        'X' => 100.0,
        _ => return 0.0,
    };
    let magnitude: &str = chars.as_str();
    magnitude
        .parse::<f64>()
        .map(|m| multiplier * m)
        .unwrap_or(0.0)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Analyzes trend and risk level in a flare record list.
///
/// Splits intensities into early/recent halves; the trend is ESCALATING when
/// the recent average exceeds 1.3x the early average, DECLINING below 0.7x,
/// otherwise STABLE. Risk is tiered on the strongest flare seen.
pub fn analyze_flare_escalation(flares: &[Value]) -> Value {
    if flares.is_empty() {
        return json!({
            "trend": "STABLE",
            "risk_level": "LOW",
            "reasoning": "No solar activity detected.",
            "statistics": {"flare_count": 0}
        });
    }

    let intensities: Vec<f64> = flares
        .iter()
        .filter_map(|f| f.get("classType").and_then(Value::as_str))
        .map(class_intensity)
        .filter(|v| *v > 0.0)
        .collect();
    if intensities.is_empty() {
        return json!({
            "trend": "STABLE",
            "risk_level": "LOW",
            "reasoning": "No measurable flare intensities detected."
        });
    }

    let midpoint = intensities.len() / 2;
    let (early, recent) = intensities.split_at(midpoint);
    let early_avg = if early.is_empty() {
        0.0
    } else {
        early.iter().sum::<f64>() / early.len() as f64
    };
    let recent_avg = recent.iter().sum::<f64>() / recent.len() as f64;
    let trend = if recent_avg > early_avg * 1.3 {
        "ESCALATING"
    } else if recent_avg < early_avg * 0.7 {
        "DECLINING"
    } else {
        "STABLE"
    };

    let max_intensity = intensities.iter().cloned().fold(f64::MIN, f64::max);
    let trend_word = trend.to_lowercase();
    let (risk, reasoning) = if max_intensity >= 100.0 {
        (
            "SEVERE",
            format!("X-class flare ({max_intensity}) detected; {trend_word} trend."),
        )
    } else if max_intensity >= 50.0 {
        (
            "HIGH",
            format!("Strong M-class activity ({max_intensity}); {trend_word} trend."),
        )
    } else if max_intensity >= 10.0 {
        (
            "MODERATE",
            format!("M-class activity ({max_intensity}); {trend_word} trend."),
        )
    } else {
        (
            "LOW",
            format!("C-class only ({max_intensity}); {trend_word} trend."),
        )
    };

    json!({
        "trend": trend,
        "risk_level": risk,
        "reasoning": reasoning,
        "statistics": {
            "flare_count": flares.len(),
            "max_intensity": round2(max_intensity),
            "recent_avg": round2(recent_avg),
            "early_avg": round2(early_avg),
        }
    })
}

/// Predicts the magnetosphere impact of one flare.
///
/// CMEs are considered likely for X-class flares and M1+ flares. Transit
/// speed scales with magnitude, the Kp estimate with class, and the direct
/// impact probability with the source longitude: eastern-limb events tend to
/// miss Earth, western-limb events are geo-effective.
pub fn predict_magnetosphere_impact(flare_class: &str, source_location: &str) -> Value {
    if flare_class.len() < 2 {
        return json!({"error": "Invalid flare class"});
    }

    let Some(first) = flare_class.chars().next() else {
        return json!({"error": "Invalid flare class"});
    };
    let band = first.to_ascii_uppercase();
    let magnitude: f64 = flare_class[first.len_utf8()..].parse().unwrap_or(1.0);

    let cme_likely = band == 'X' || (band == 'M' && magnitude >= 1.0);
    if !cme_likely {
        return json!({
            "cme_likely": false,
            "direct_impact_probability": "LOW",
            "explanation": format!("{flare_class} flares rarely produce Earth-directed CMEs."),
        });
    }

    let speed = if band == 'X' {
        500.0 * (2.0 + magnitude / 10.0)
    } else {
        500.0 * (1.2 + magnitude / 20.0)
    };
    let arrival_hours = (1.5e8 / speed / 3600.0) as i64;
    let kp_estimate = if band == 'X' && magnitude >= 5.0 {
        8
    } else if band == 'X' {
        7
    } else if magnitude >= 5.0 {
        6
    } else {
        5
    };

    let (probability, probability_reason) = if source_location.is_empty()
        || source_location.contains("Unknown")
    {
        ("MODERATE", "source location is unknown.".to_string())
    } else if source_location.contains('E') {
        (
            "LOW",
            format!(
                "its location at {source_location} is on the eastern limb, so a CME is likely to miss Earth."
            ),
        )
    } else if source_location.contains('W') {
        (
            "HIGH",
            format!(
                "its location at {source_location} is on the western limb, which is geo-effective."
            ),
        )
    } else {
        (
            "MODERATE",
            format!("its location at {source_location} is near the center."),
        )
    };

    let effects = if kp_estimate >= 7 {
        json!(["Severe GPS disruptions", "Radio blackouts", "Aurora at mid-latitudes"])
    } else {
        json!(["GPS degradation", "HF interference", "Aurora at high latitudes"])
    };
    let storm_word = if kp_estimate >= 7 { "severe" } else { "strong" };
    let explanation = format!(
        "The estimated Kp index is {kp_estimate} (a {storm_word} geomagnetic storm) due to the \
         high power of the {flare_class} flare. However, the probability of a *direct* Earth \
         impact is rated '{probability}' because {probability_reason}"
    );

    json!({
        "cme_likely": true,
        "arrival_time_hours": arrival_hours,
        "kp_index_estimate": kp_estimate,
        "impact_probability": probability,
        "effects": effects,
        "explanation": explanation,
        "reasoning": format!(
            "{flare_class} flare from {source_location} likely to reach Earth in ~{} days.",
            arrival_hours / 24
        ),
    })
}

/// Assesses LEO/MEO/GEO satellite vulnerability from flare strength and
/// geomagnetic activity. A missing Kp reading defaults by flare class.
pub fn calculate_satellite_vulnerability(flare_class: &str, kp_index: Option<i64>) -> Value {
    let flare_class = if flare_class.is_empty() {
        "M1.0"
    } else {
        flare_class
    };
    let kp_index = kp_index.unwrap_or_else(|| {
        if flare_class.starts_with('X') {
            7
        } else if flare_class.starts_with('M') {
            5
        } else {
            3
        }
    });

    let severity = if kp_index >= 7 || flare_class.starts_with('X') {
        "SEVERE"
    } else if kp_index >= 5 || flare_class.starts_with('M') {
        "HIGH"
    } else if kp_index >= 4 {
        "MODERATE"
    } else {
        "LOW"
    };
    let elevated = severity == "SEVERE" || severity == "HIGH";

    let orbit = |risk: &str, issues: Value, recommendations: Value| {
        json!({"risk": risk, "issues": issues, "recommendations": recommendations})
    };
    let vulnerabilities = json!({
        "LEO": orbit(
            if elevated { "HIGH" } else { "LOW" },
            if elevated {
                json!(["Increased atmospheric drag", "Orbit decay", "Comm dropouts"])
            } else {
                json!(["Nominal"])
            },
            if elevated {
                json!(["Track more often", "Reboost if needed"])
            } else {
                json!(["Normal ops"])
            },
        ),
        "MEO": orbit(
            if elevated { "HIGH" } else { "LOW" },
            if elevated {
                json!(["Degraded GPS accuracy", "Radiation exposure"])
            } else {
                json!(["Minimal impact"])
            },
            if elevated {
                json!(["Enable multi-constellation", "Scrub memory"])
            } else {
                json!(["Standard ops"])
            },
        ),
        "GEO": orbit(
            if elevated { "HIGH" } else { "LOW" },
            if elevated {
                json!(["Charging risk", "Attitude control issues"])
            } else {
                json!(["Normal conditions"])
            },
            if elevated {
                json!(["Monitor charging", "Prepare safing"])
            } else {
                json!(["Normal ops"])
            },
        ),
    });

    json!({
        "overall_severity": severity,
        "kp_index": kp_index,
        "flare_class": flare_class,
        "vulnerabilities": vulnerabilities,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

/// Generates a structured operational alert for satellite operators.
pub fn generate_operational_alert(risk_level: &str, flare_class: &str, impact_hours: i64) -> Value {
    let risk = risk_level.to_uppercase();
    let actions = match risk.as_str() {
        "SEVERE" => json!([
            "Activate emergency protocols",
            "Reduce transmit power",
            "Enable redundant systems"
        ]),
        "HIGH" => json!(["Increase monitoring", "Review emergency procedures"]),
        "MODERATE" => json!(["Continue monitoring", "Review forecasts"]),
        "LOW" => json!(["Routine monitoring"]),
        _ => json!(["Standard operations"]),
    };

    let now = Utc::now();
    json!({
        "meta": {
            "id": format!("ASTROPULSE-{}", now.format("%Y%m%d-%H%M%S")),
            "timestamp": now.to_rfc3339(),
            "generated_by": "AstroPulse AI",
        },
        "severity": risk,
        "flare_class": flare_class,
        "impact_eta_hours": impact_hours,
        "title": format!("{risk} SPACE WEATHER ALERT"),
        "summary": format!("{flare_class} flare detected. Impact expected in ~{impact_hours}h."),
        "actions": actions,
    })
}
