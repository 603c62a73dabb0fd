/// Maximum weight a centroid centred at normalized rank `q` may hold.
///
/// `4·N·q·(1−q)/C`: largest around the median, shrinking toward both tails so
/// that extreme quantiles stay resolved by small centroids.
#[inline]
pub(crate) fn threshold(q: f64, total_weight: u32, compression: f64) -> f64 {
    4.0 * f64::from(total_weight) * q * (1.0 - q) / compression
}
