use crate::metrics::{
    Descriptor,
    Sample,
    ValueType,
};
use prometheus_client::{
    collector::Collector,
    encoding::{
        DescriptorEncoder,
        EncodeMetric,
    },
    metrics::{
        counter::ConstCounter,
        gauge::ConstGauge,
        MetricType,
    },
    registry::Registry,
};
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt,
    sync::Arc,
};

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Debug)]
struct Family {
    descriptor: Arc<Descriptor>,
    value_type: ValueType,
    samples: Vec<Sample>,
}

/// The samples of one scrape, grouped by metric name in first-seen order.
#[derive(Debug)]
struct ScrapeSnapshot {
    families: Vec<Family>,
}

impl ScrapeSnapshot {
    fn new(samples: Vec<Sample>) -> Self {
        let mut families: Vec<Family> = Vec::new();
        let mut index = HashMap::<String, usize>::new();

        for sample in samples {
            let fq_name = sample.descriptor().fq_name();
            if let Some(&position) = index.get(fq_name) {
                let family = &mut families[position];
                if family.value_type != sample.value_type() {
                    warn!(
                        metric = fq_name,
                        expected = %family.value_type,
                        actual = %sample.value_type(),
                        "Dropping sample with conflicting value type"
                    );
                    continue;
                }
                family.samples.push(sample);
            } else {
                index.insert(fq_name.to_string(), families.len());
                families.push(Family {
                    descriptor: Arc::clone(sample.descriptor()),
                    value_type: sample.value_type(),
                    samples: vec![sample],
                });
            }
        }

        Self { families }
    }
}

impl Collector for ScrapeSnapshot {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), fmt::Error> {
        for family in &self.families {
            let metric_type = match family.value_type {
                ValueType::Gauge => MetricType::Gauge,
                ValueType::Counter => MetricType::Counter,
            };
            let mut metric_encoder = encoder.encode_descriptor(
                family.descriptor.fq_name(),
                family.descriptor.help(),
                None,
                metric_type,
            )?;

            for sample in &family.samples {
                let labels: Vec<(&str, Cow<'_, str>)> = sample
                    .labels()
                    .map(|(name, value)| (name, escape_label_value(value)))
                    .collect();
                let sample_encoder = metric_encoder.encode_family(&labels)?;
                match family.value_type {
                    ValueType::Gauge => ConstGauge::new(sample.value()).encode(sample_encoder)?,
                    ValueType::Counter => ConstCounter::new(sample.value()).encode(sample_encoder)?,
                }
            }
        }
        Ok(())
    }
}

/// Escapes backslashes, double quotes and newlines. The encoder writes label
/// values verbatim and they come straight from server replies.
fn escape_label_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', '"', '\n']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Renders the samples of one scrape as OpenMetrics text.
pub fn encode_samples(samples: Vec<Sample>) -> Result<String, fmt::Error> {
    let mut registry = Registry::default();
    registry.register_collector(Box::new(ScrapeSnapshot::new(samples)));

    let mut body = String::new();
    prometheus_client::encoding::text::encode(&mut body, &registry)?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(descriptor: &Arc<Descriptor>, value_type: ValueType, value: f64, labels: &[&str]) -> Sample {
        let labels = labels.iter().map(|l| l.to_string()).collect();
        Sample::new(descriptor, value_type, value, labels, 1).unwrap()
    }

    #[test]
    fn samples_are_grouped_in_first_seen_order() {
        let online = Descriptor::new("players", "online", "Minecraft players online.", &["username"]);
        let max = Descriptor::new("server", "players_max", "Maximum players.", &[]);

        let snapshot = ScrapeSnapshot::new(vec![
            sample(&online, ValueType::Gauge, 1.0, &["Alice"]),
            sample(&max, ValueType::Gauge, 20.0, &[]),
            sample(&online, ValueType::Gauge, 1.0, &["Bob"]),
        ]);

        let names: Vec<_> = snapshot
            .families
            .iter()
            .map(|f| (f.descriptor.fq_name(), f.samples.len()))
            .collect();
        assert_eq!(names, vec![("minecraft_players_online", 2), ("minecraft_server_players_max", 1)]);
    }

    #[test]
    fn conflicting_value_types_keep_the_first() {
        let ticks = Descriptor::new("world", "ticks", "help", &[]);
        let snapshot = ScrapeSnapshot::new(vec![
            sample(&ticks, ValueType::Counter, 10.0, &[]),
            sample(&ticks, ValueType::Gauge, 11.0, &[]),
        ]);

        assert_eq!(snapshot.families.len(), 1);
        assert_eq!(snapshot.families[0].value_type, ValueType::Counter);
        assert_eq!(snapshot.families[0].samples.len(), 1);
    }

    #[test]
    fn encodes_labels_and_types() {
        let online = Descriptor::new(
            "players",
            "online",
            "Minecraft players online.",
            &["username", "dimension"],
        );
        let gametime = Descriptor::new("world", "gametime_ticks", "Ticks since the world was created.", &[]);

        let body = encode_samples(vec![
            sample(&online, ValueType::Gauge, 1.0, &["Alice", "overworld"]),
            sample(&gametime, ValueType::Counter, 24000.0, &[]),
        ])
        .unwrap();

        assert!(body.contains("# TYPE minecraft_players_online gauge"), "{body}");
        assert!(
            body.contains(r#"minecraft_players_online{username="Alice",dimension="overworld"} 1"#),
            "{body}"
        );
        assert!(body.contains("# TYPE minecraft_world_gametime_ticks counter"), "{body}");
        assert!(body.contains("minecraft_world_gametime_ticks_total 24000"), "{body}");
        assert!(body.ends_with("# EOF\n"), "{body}");
    }

    #[test]
    fn label_values_are_escaped() {
        assert_eq!(escape_label_value("Alice"), "Alice");
        assert_eq!(escape_label_value(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_label_value("line\nbreak"), r"line\nbreak");
    }

    #[test]
    fn hostile_label_values_keep_the_body_well_formed() {
        let online = Descriptor::new("players", "online", "help", &["username", "experience"]);
        let max = Descriptor::new("server", "players_max", "help", &[]);

        let body = encode_samples(vec![
            sample(&online, ValueType::Gauge, 1.0, &["Alice", r#"3"} 9 \"#]),
            sample(&max, ValueType::Gauge, 20.0, &[]),
        ])
        .unwrap();

        assert!(
            body.contains(r#"minecraft_players_online{username="Alice",experience="3\"} 9 \\"} 1"#),
            "{body}"
        );
        assert_eq!(body.lines().filter(|line| line.starts_with("minecraft_")).count(), 2, "{body}");
        assert!(body.contains("minecraft_server_players_max 20"), "{body}");
    }

    #[test]
    fn empty_scrape_is_just_eof() {
        assert_eq!(encode_samples(Vec::new()).unwrap(), "# EOF\n");
    }
}
