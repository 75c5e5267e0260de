/// Tab values for the filter bar.
///
/// Multiple filter sources can work on the same item type `T`, for example
/// filtering DSA problems by topic or by difficulty.
pub trait FilterSource<T>: Clone + Default + PartialEq + 'static {
  /// Human-readable label for this filter source
  fn label(&self) -> &'static str;

  /// Distinct values present in `items`, in display order.
  /// `None` stands for items with no value for the field.
  fn unique_values(&self, items: &[T]) -> Vec<Option<String>>;

  /// Filter items by a specific value.
  /// - `None` means "All" (no filtering)
  /// - `Some(None)` means items with no value for the field
  /// - `Some(Some(v))` means items matching v
  fn filter<'a>(&self, items: &'a [T], value: Option<&Option<String>>) -> Vec<&'a T>;

  /// False for the "None" variant
  fn is_active(&self) -> bool;

  /// Every variant, in cycling order
  fn all_variants() -> &'static [Self];

  /// The variant after this one, wrapping around.
  fn next(&self) -> Self {
    let variants = Self::all_variants();
    let idx = variants.iter().position(|v| v == self).unwrap_or(0);
    variants
      .get((idx + 1) % variants.len().max(1))
      .cloned()
      .unwrap_or_default()
  }
}
