//! Data-plane reachability probes.
//!
//! [`PingProber`] runs the host `ping` binary and parses its summary block.
//! Both the iputils and busybox summary formats are understood:
//!
//! ```text
//! 5 packets transmitted, 5 received, +1 duplicates, 0% packet loss, time 4005ms
//! rtt min/avg/max/mdev = 0.045/0.061/0.079/0.011 ms
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{IpsecError, IpsecResult};
use crate::shell::{self, shellquote, PING_CMD};

static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d+) packets transmitted, (\d+) (?:packets )?received(?:, \+(\d+) duplicates)?(?:, \+\d+ errors)?, ([\d.]+)% packet loss",
    )
    .expect("Invalid regex pattern")
});

static RTT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:rtt|round-trip) min/avg/max(?:/mdev)? = ([\d.]+)/([\d.]+)/([\d.]+)(?:/([\d.]+))? ms")
        .expect("Invalid regex pattern")
});

/// Round-trip times in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RttSummary {
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    /// Not reported by busybox.
    pub mdev_ms: Option<f64>,
}

/// Summary of one probe run.
#[derive(Debug, Clone, PartialEq)]
pub struct PingStatistics {
    pub transmitted: u32,
    pub received: u32,
    pub duplicates: u32,
    pub loss_percent: f64,
    /// Absent when nothing was received.
    pub rtt: Option<RttSummary>,
}

impl PingStatistics {
    /// True when at least one echo reply came back.
    pub fn reachable(&self) -> bool {
        self.received > 0
    }

    /// Parses the summary lines of `ping` output.
    pub fn parse(output: &str) -> IpsecResult<Self> {
        let caps = SUMMARY_RE.captures(output).ok_or_else(|| IpsecError::ProbeParse {
            message: "no packet summary in ping output".to_string(),
        })?;

        let transmitted = parse_field(&caps[1], "transmitted")?;
        let received = parse_field(&caps[2], "received")?;
        let duplicates = match caps.get(3) {
            Some(m) => parse_field(m.as_str(), "duplicates")?,
            None => 0,
        };
        let loss_percent = parse_field(&caps[4], "packet loss")?;

        let rtt = match RTT_RE.captures(output) {
            Some(caps) => Some(RttSummary {
                min_ms: parse_field(&caps[1], "rtt min")?,
                avg_ms: parse_field(&caps[2], "rtt avg")?,
                max_ms: parse_field(&caps[3], "rtt max")?,
                mdev_ms: caps
                    .get(4)
                    .map(|m| parse_field(m.as_str(), "rtt mdev"))
                    .transpose()?,
            }),
            None => None,
        };

        Ok(Self {
            transmitted,
            received,
            duplicates,
            loss_percent,
            rtt,
        })
    }
}

impl fmt::Display for PingStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} transmitted, {} received, {}% loss",
            self.transmitted, self.received, self.loss_percent
        )?;
        if self.duplicates > 0 {
            write!(f, ", {} duplicates", self.duplicates)?;
        }
        if let Some(rtt) = &self.rtt {
            write!(f, ", rtt avg {:.3} ms", rtt.avg_ms)?;
        }
        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(value: &str, field: &str) -> IpsecResult<T> {
    value.parse().map_err(|_| IpsecError::ProbeParse {
        message: format!("invalid {} value '{}'", field, value),
    })
}

/// Sends echo requests to a target and reports what came back.
///
/// Implementations return statistics even when nothing was received;
/// deciding whether that counts as a failure is up to the caller.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &str, count: u32) -> IpsecResult<PingStatistics>;
}

/// Prober backed by the system `ping` binary.
#[derive(Debug, Clone)]
pub struct PingProber {
    /// Upper bound on one probe run, passed to `ping -w`.
    pub deadline: Duration,
}

impl Default for PingProber {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(10),
        }
    }
}

impl PingProber {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    fn command(&self, target: &str, count: u32) -> String {
        format!(
            "{} -c {} -w {} {}",
            PING_CMD,
            count,
            self.deadline.as_secs().max(1),
            shellquote(target)
        )
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, target: &str, count: u32) -> IpsecResult<PingStatistics> {
        let cmd = self.command(target, count);
        debug!(target = %target, count, "Probing");

        // ping -w bounds the run; the outer timeout only covers a wedged child.
        let budget = self.deadline + Duration::from_secs(2);
        let result = tokio::time::timeout(budget, shell::exec(&cmd))
            .await
            .map_err(|_| IpsecError::Timeout {
                operation: format!("ping {}", target),
                after: budget,
            })??;

        // ping exits 1 on total loss but still prints a summary.
        match PingStatistics::parse(&result.stdout) {
            Ok(stats) => {
                info!(target = %target, stats = %stats, "Probe finished");
                Ok(stats)
            }
            Err(_) if !result.success() => Err(IpsecError::ShellCommandFailed {
                command: cmd,
                exit_code: result.exit_code,
                output: result.combined(),
            }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const IPUTILS_OK: &str = "PING 10.1.0.2 (10.1.0.2) 56(84) bytes of data.
64 bytes from 10.1.0.2: icmp_seq=1 ttl=64 time=0.061 ms
64 bytes from 10.1.0.2: icmp_seq=2 ttl=64 time=0.045 ms

--- 10.1.0.2 ping statistics ---
5 packets transmitted, 5 received, 0% packet loss, time 4005ms
rtt min/avg/max/mdev = 0.045/0.061/0.079/0.011 ms";

    #[test]
    fn test_parse_iputils() {
        let stats = PingStatistics::parse(IPUTILS_OK).unwrap();
        assert_eq!(stats.transmitted, 5);
        assert_eq!(stats.received, 5);
        assert_eq!(stats.duplicates, 0);
        assert_eq!(stats.loss_percent, 0.0);
        assert_eq!(
            stats.rtt,
            Some(RttSummary {
                min_ms: 0.045,
                avg_ms: 0.061,
                max_ms: 0.079,
                mdev_ms: Some(0.011),
            })
        );
        assert!(stats.reachable());
    }

    #[test]
    fn test_parse_duplicates_and_loss() {
        let out = "5 packets transmitted, 3 received, +2 duplicates, 40% packet loss, time 4006ms
rtt min/avg/max/mdev = 1.1/2.2/3.3/0.4 ms";
        let stats = PingStatistics::parse(out).unwrap();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.duplicates, 2);
        assert_eq!(stats.loss_percent, 40.0);
    }

    #[test]
    fn test_parse_total_loss() {
        let out = "--- 10.9.9.9 ping statistics ---
5 packets transmitted, 0 received, +5 errors, 100% packet loss, time 4092ms";
        let stats = PingStatistics::parse(out).unwrap();
        assert_eq!(stats.received, 0);
        assert_eq!(stats.rtt, None);
        assert!(!stats.reachable());
    }

    #[test]
    fn test_parse_busybox() {
        let out = "5 packets transmitted, 5 packets received, 0% packet loss
round-trip min/avg/max = 0.102/0.140/0.201 ms";
        let stats = PingStatistics::parse(out).unwrap();
        assert_eq!(stats.received, 5);
        assert_eq!(stats.rtt.map(|r| r.mdev_ms), Some(None));
    }

    #[test]
    fn test_parse_garbage() {
        let err = PingStatistics::parse("ping: unknown host").unwrap_err();
        assert!(matches!(err, IpsecError::ProbeParse { .. }));
    }

    #[test]
    fn test_command_quotes_target() {
        let prober = PingProber::new(Duration::from_secs(5));
        assert_eq!(
            prober.command("10.1.0.2; reboot", 5),
            "/bin/ping -c 5 -w 5 \"10.1.0.2; reboot\""
        );
    }

    #[test]
    fn test_display() {
        let stats = PingStatistics::parse(IPUTILS_OK).unwrap();
        assert_eq!(
            stats.to_string(),
            "5 transmitted, 5 received, 0% loss, rtt avg 0.061 ms"
        );
    }
}
