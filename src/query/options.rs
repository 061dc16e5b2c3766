use crate::error::OptionsError;
use crate::math::edge_distance::update_min_distance_max_error;
use crate::math::ChordAngle;

/// Value of [`Options::max_results`] meaning "no limit".
pub const UNLIMITED_RESULTS: usize = usize::MAX;

/// Parameters of a closest-edge query.
///
/// The defaults return every edge of the index, sorted by distance. Setters
/// validate their input and return `&mut Self` so they can be chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub(super) max_results: usize,
    pub(super) max_distance: ChordAngle,
    pub(super) max_error: ChordAngle,
    pub(super) include_interiors: bool,
    pub(super) use_brute_force: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_results: UNLIMITED_RESULTS,
            max_distance: ChordAngle::INFINITY,
            max_error: ChordAngle::ZERO,
            include_interiors: false,
            use_brute_force: false,
        }
    }
}

impl Options {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the maximum number of results.
    #[must_use]
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Only results strictly closer than this are returned.
    #[must_use]
    pub fn max_distance(&self) -> ChordAngle {
        self.max_distance
    }

    /// Returns the allowed distance error.
    #[must_use]
    pub fn max_error(&self) -> ChordAngle {
        self.max_error
    }

    /// Returns true if containing polygons are reported.
    #[must_use]
    pub fn include_interiors(&self) -> bool {
        self.include_interiors
    }

    /// Returns true if every edge is scanned.
    #[must_use]
    pub fn use_brute_force(&self) -> bool {
        self.use_brute_force
    }

    /// Sets the maximum number of results to return.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::ZeroMaxResults`] if `n` is zero.
    pub fn set_max_results(&mut self, n: usize) -> Result<&mut Self, OptionsError> {
        if n == 0 {
            return Err(OptionsError::ZeroMaxResults);
        }
        self.max_results = n;
        Ok(self)
    }

    /// Sets the exclusive distance limit: only edges at distance
    /// `< max_distance` are returned.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::NegativeDistance`] if `d` is negative.
    pub fn set_max_distance(&mut self, d: ChordAngle) -> Result<&mut Self, OptionsError> {
        self.max_distance = non_negative("max_distance", d)?;
        Ok(self)
    }

    /// Sets an inclusive distance limit: edges at distance `<= d` are
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::NegativeDistance`] if `d` is negative.
    pub fn set_inclusive_max_distance(&mut self, d: ChordAngle) -> Result<&mut Self, OptionsError> {
        self.max_distance = non_negative("max_distance", d)?.successor();
        Ok(self)
    }

    /// Like [`Options::set_inclusive_max_distance`], but widened by the
    /// maximum error of the distance computation, so that every edge whose
    /// true distance is `<= d` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::NegativeDistance`] if `d` is negative.
    pub fn set_conservative_max_distance(
        &mut self,
        d: ChordAngle,
    ) -> Result<&mut Self, OptionsError> {
        let d = non_negative("max_distance", d)?;
        self.max_distance = d.plus_error(update_min_distance_max_error(d)).successor();
        Ok(self)
    }

    /// Allows results up to `e` farther than the true closest edges, in
    /// exchange for faster queries.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::NegativeDistance`] if `e` is negative.
    pub fn set_max_error(&mut self, e: ChordAngle) -> Result<&mut Self, OptionsError> {
        self.max_error = non_negative("max_error", e)?;
        Ok(self)
    }

    /// Whether shapes whose interior contains the target are reported with
    /// distance zero.
    pub fn set_include_interiors(&mut self, include: bool) -> &mut Self {
        self.include_interiors = include;
        self
    }

    /// Forces a linear scan over all edges (for testing).
    pub fn set_use_brute_force(&mut self, use_brute_force: bool) -> &mut Self {
        self.use_brute_force = use_brute_force;
        self
    }
}

fn non_negative(option: &'static str, d: ChordAngle) -> Result<ChordAngle, OptionsError> {
    if d.is_negative() {
        return Err(OptionsError::NegativeDistance {
            option,
            length2: d.length2(),
        });
    }
    Ok(d)
}
