use serde::Serialize;

use crate::summary::HostSummary;

/// One row of the host comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    /// 1-based position.
    pub rank: usize,
    pub host: String,
    pub resolved_ip: String,
    pub overall_average_rtt: f64,
    pub best_average_rtt: f64,
}

/// Hosts ordered fastest first. Only built by [`Ranking::from_summaries`],
/// which never yields an empty ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    entries: Vec<ComparisonEntry>,
}

impl Ranking {
    /// Sorts by overall average RTT, keeping input order for equal values.
    /// Returns `None` when there is nothing to compare.
    pub fn from_summaries<'a, I>(summaries: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a HostSummary>,
    {
        let mut entries: Vec<ComparisonEntry> = summaries
            .into_iter()
            .map(|s| ComparisonEntry {
                rank: 0,
                host: s.host.clone(),
                resolved_ip: s.resolved_ip.clone(),
                overall_average_rtt: s.overall_average_rtt,
                best_average_rtt: s.best().average_rtt(),
            })
            .collect();
        if entries.is_empty() {
            return None;
        }

        entries.sort_by(|a, b| a.overall_average_rtt.total_cmp(&b.overall_average_rtt));
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }
        Some(Self { entries })
    }

    /// Entries in rank order.
    pub fn entries(&self) -> &[ComparisonEntry] {
        &self.entries
    }

    pub fn fastest(&self) -> &ComparisonEntry {
        &self.entries[0]
    }

    pub fn slowest(&self) -> &ComparisonEntry {
        &self.entries[self.entries.len() - 1]
    }

    /// Headline figure for the fastest host: its best per-size average.
    pub fn fastest_rtt(&self) -> f64 {
        self.fastest().best_average_rtt
    }

    /// Headline figure for the slowest host: its overall average.
    pub fn slowest_rtt(&self) -> f64 {
        self.slowest().overall_average_rtt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::{ProbeResult, ProbeSample};

    fn summary(host: &str, per_size_avgs: &[f64]) -> HostSummary {
        let results = per_size_avgs
            .iter()
            .enumerate()
            .map(|(i, avg)| {
                ProbeResult::from_samples(
                    host,
                    None,
                    32 * (i as u32 + 1),
                    4,
                    vec![ProbeSample::from_millis(*avg).unwrap()],
                )
            })
            .collect();
        HostSummary::from_results(host, results).unwrap()
    }

    #[test]
    fn test_sorted_ascending() {
        let slow = summary("slow", &[45.2]);
        let fast = summary("fast", &[10.0, 14.2]);
        let ranking = Ranking::from_summaries([&slow, &fast]).unwrap();

        assert_eq!(ranking.fastest().host, "fast");
        assert_eq!(ranking.fastest().rank, 1);
        assert!((ranking.fastest().overall_average_rtt - 12.1).abs() < 1e-9);
        assert_eq!(ranking.fastest_rtt(), 10.0);
        assert_eq!(ranking.slowest().host, "slow");
        assert_eq!(ranking.slowest().rank, 2);
        assert_eq!(ranking.slowest_rtt(), 45.2);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let a = summary("a", &[20.0]);
        let b = summary("b", &[5.0]);
        let c = summary("c", &[20.0]);
        let d = summary("d", &[20.0]);

        let ranking = Ranking::from_summaries([&a, &b, &c, &d]).unwrap();
        let hosts: Vec<&str> = ranking.entries().iter().map(|e| e.host.as_str()).collect();
        assert_eq!(hosts, vec!["b", "a", "c", "d"]);

        let ranking = Ranking::from_summaries([&d, &c, &b, &a]).unwrap();
        let hosts: Vec<&str> = ranking.entries().iter().map(|e| e.host.as_str()).collect();
        assert_eq!(hosts, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_entries_bounded_by_fastest_and_slowest() {
        let a = summary("a", &[30.0]);
        let b = summary("b", &[10.0]);
        let c = summary("c", &[20.0]);

        let ranking = Ranking::from_summaries([&a, &b, &c]).unwrap();
        let entries = ranking.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.first(), Some(ranking.fastest()));
        assert_eq!(entries.last(), Some(ranking.slowest()));
        let ranks: Vec<usize> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_has_no_ranking() {
        assert!(Ranking::from_summaries(std::iter::empty::<&HostSummary>()).is_none());
    }

    #[test]
    fn test_single_host_is_fastest_and_slowest() {
        let only = summary("only", &[7.0, 9.0]);
        let ranking = Ranking::from_summaries([&only]).unwrap();
        assert_eq!(ranking.fastest(), ranking.slowest());
        assert_eq!(ranking.fastest_rtt(), 7.0);
        assert_eq!(ranking.slowest_rtt(), 8.0);
    }
}
