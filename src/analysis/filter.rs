use crate::error::{StreamError, StreamResult};
use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type, Q_BUTTERWORTH_F64};
use ndarray::{Array1, ArrayView1};

/// Zero-phase Butterworth high-pass, used to strip baseline wander before
/// peak detection.
pub fn highpass_filter(data: ArrayView1<f64>, cutoff: f64, fs: f64) -> StreamResult<Array1<f64>> {
    let coefficients = Coefficients::<f64>::from_params(Type::HighPass, fs.hz(), cutoff.hz(), Q_BUTTERWORTH_F64)
        .map_err(|e| StreamError::Filter(format!("high-pass {cutoff} Hz at fs={fs} Hz: {e:?}")))?;
    Ok(forward_backward_filter(data, &coefficients))
}

fn forward_backward_filter(data: ArrayView1<f64>, coefficients: &Coefficients<f64>) -> Array1<f64> {
    let mut processed: Vec<f64> = data.to_vec();

    let mut filter = DirectForm1::<f64>::new(*coefficients);
    for sample in processed.iter_mut() {
        *sample = filter.run(*sample);
    }

    // Second pass runs over the reversed signal with fresh state, cancelling the phase shift.
    processed.reverse();
    let mut filter = DirectForm1::<f64>::new(*coefficients);
    for sample in processed.iter_mut() {
        *sample = filter.run(*sample);
    }
    processed.reverse();

    Array1::from(processed)
}
