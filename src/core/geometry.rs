use crate::types::{DdmError, DdmResult, MaskedArray};
use ndarray::{Array2, Ix1, Ix2, Zip};

/// Antenna-to-specular-point slant distance per grid cell.
///
/// `distance = (ac_alt[t] - sp_alt[t, x]) / cos(inc_deg[t, x])`, with the
/// aircraft altitude broadcast across the cross-track axis. A cell is masked
/// when any of its inputs is masked. Grazing incidence (90 degrees) divides by
/// a cosine near zero and yields a huge or infinite value; that is left for the
/// quality mask's finiteness check.
pub fn slant_distance(
    ac_alt: &MaskedArray<Ix1>,
    sp_alt: &MaskedArray<Ix2>,
    inc_angle_deg: &MaskedArray<Ix2>,
) -> DdmResult<MaskedArray<Ix2>> {
    let (tracks, xtracks) = sp_alt.data.dim();

    if ac_alt.data.len() != tracks {
        return Err(DdmError::Shape {
            field: crate::types::fields::AC_ALT.to_string(),
            expected: format!("[{}]", tracks),
            found: format!("{:?}", ac_alt.shape()),
        });
    }
    if inc_angle_deg.data.dim() != (tracks, xtracks) {
        return Err(DdmError::Shape {
            field: crate::types::fields::SP_INC_ANGLE.to_string(),
            expected: format!("[{}, {}]", tracks, xtracks),
            found: format!("{:?}", inc_angle_deg.shape()),
        });
    }

    log::debug!("Computing slant distance over {}x{} grid", tracks, xtracks);

    let mut distance = Array2::<f64>::zeros((tracks, xtracks));
    Zip::indexed(&mut distance)
        .and(&sp_alt.data)
        .and(&inc_angle_deg.data)
        .for_each(|(t, _), d, &alt, &inc| {
            *d = (ac_alt.data[t] - alt) / inc.to_radians().cos();
        });

    let mask = Array2::from_shape_fn((tracks, xtracks), |(t, x)| {
        ac_alt.is_masked(t) || sp_alt.is_masked((t, x)) || inc_angle_deg.is_masked((t, x))
    });

    MaskedArray::with_mask(distance, mask)
}
