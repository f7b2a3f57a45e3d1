use log::info;
use serde::{Deserialize, Serialize};

use crate::evaluate::Confusion;

/// Classification summary of one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Accuracy.
    pub acc: f64,
    /// Sensitivity (true positive rate).
    pub sen: f64,
    /// Specificity (true negative rate).
    pub spc: f64,
    /// Precision (positive predictive value).
    pub ppv: f64,
    /// Negative predictive value.
    pub npv: f64,
    /// Matthews correlation coefficient.
    pub mcc: f64,
}

/// Bumps a zero count to one so every ratio below is defined.
fn smooth(name: &str, count: u64) -> f64 {
    if count == 0 {
        info!("added 1 to {name} as smoothing");
        1.0
    } else {
        count as f64
    }
}

/// Reduces raw counts to accuracy, sensitivity, specificity, precision
/// and MCC. Zero counts are replaced by one first.
///
/// MCC is taken as `sqrt(PPV·TPR·TNR·NPV) − sqrt(FDR·FNR·FPR·FOR)`, which
/// equals the covariance form but never multiplies raw counts together.
pub fn reduce(confusion: &Confusion) -> Metrics {
    let tp = smooth("TP", confusion.tp);
    let tn = smooth("TN", confusion.tn);
    let fp = smooth("FP", confusion.fp);
    let fn_ = smooth("FN", confusion.fn_);

    let acc = (tp + tn) / (tp + tn + fp + fn_);
    let sen = tp / (tp + fn_);
    let spc = tn / (tn + fp);
    let ppv = tp / (tp + fp);
    let npv = tn / (tn + fn_);

    let mcc = (ppv * sen * spc * npv).sqrt() - ((1.0 - ppv) * (1.0 - sen) * (1.0 - spc) * (1.0 - npv)).sqrt();

    Metrics {
        acc,
        sen,
        spc,
        ppv,
        npv,
        mcc,
    }
}
