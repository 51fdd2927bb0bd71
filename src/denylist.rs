/// Device classes whose elapsed-time measurements are known to be
/// unconditionally wrong. Matched by substring against the queue's device
/// identifier once, before the first measurement is submitted.
const DENYLISTED_DEVICE_PATTERNS: &[&str] = &["Mali-4", "Adreno (TM) 3", "PowerVR SGX"];

pub(crate) fn is_denylisted(device: &str) -> bool {
    DENYLISTED_DEVICE_PATTERNS
        .iter()
        .any(|pattern| device.contains(pattern))
}
