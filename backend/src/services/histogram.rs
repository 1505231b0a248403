use crate::api::Histogram;
use crate::error::StatsResult;

/// Counts integer outcomes over a declared domain `0..=domain_max`.
///
/// Every value of the domain is reported, including zero counts, so charts
/// keep the same x axis across selections.
#[derive(Debug, Clone, Copy)]
pub struct EmpiricalHistogramBuilder {
    domain_max: u32,
}

impl EmpiricalHistogramBuilder {
    pub fn new(domain_max: u32) -> Self {
        Self { domain_max }
    }

    pub fn domain_max(&self) -> u32 {
        self.domain_max
    }

    pub fn build(&self, values: &[u32]) -> StatsResult<Histogram<u32>> {
        let mut ys = vec![0u64; self.domain_max as usize + 1];
        let mut out_of_domain = 0u64;

        for &value in values {
            match ys.get_mut(value as usize) {
                Some(count) => *count += 1,
                None => out_of_domain += 1,
            }
        }

        if out_of_domain > 0 {
            log::warn!(
                "{} values above domain maximum {} excluded from histogram",
                out_of_domain,
                self.domain_max
            );
        }

        Histogram::from_counts((0..=self.domain_max).collect(), ys, out_of_domain)
    }
}
