//! Wrappers that give user callbacks a single fallible shape.
//!
//! Operators accept plain closures and closures returning `Result`. Both are
//! wrapped here so the operator sees one call that may fail with the
//! stream's error type, and so the operator stays `Clone` whenever the user
//! callback is.

/// A callback from `In` to `Self::Output` that may fail with `Err`.
pub trait Selector<In, Err> {
  type Output;

  fn select(&mut self, input: In) -> Result<Self::Output, Err>;
}

/// A callback computing a key from a borrowed value, may fail with `Err`.
pub trait KeySelector<In, Err> {
  type Key;

  fn key_of(&mut self, input: &In) -> Result<Self::Key, Err>;
}

/// A callback that never fails.
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct Infallible<F>(pub F);

/// A callback returning `Result` with the stream's error type.
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct Fallible<F>(pub F);

/// Passes the value through unchanged.
#[derive(Clone, Copy, Default, Debug)]
pub struct Identity;

impl<F, In, Out, Err> Selector<In, Err> for Infallible<F>
where
  F: FnMut(In) -> Out,
{
  type Output = Out;

  #[inline]
  fn select(&mut self, input: In) -> Result<Out, Err> { Ok((self.0)(input)) }
}

impl<F, In, Out, Err> Selector<In, Err> for Fallible<F>
where
  F: FnMut(In) -> Result<Out, Err>,
{
  type Output = Out;

  #[inline]
  fn select(&mut self, input: In) -> Result<Out, Err> { (self.0)(input) }
}

impl<In, Err> Selector<In, Err> for Identity {
  type Output = In;

  #[inline]
  fn select(&mut self, input: In) -> Result<In, Err> { Ok(input) }
}

impl<F, In, Key, Err> KeySelector<In, Err> for Infallible<F>
where
  F: FnMut(&In) -> Key,
{
  type Key = Key;

  #[inline]
  fn key_of(&mut self, input: &In) -> Result<Key, Err> { Ok((self.0)(input)) }
}

impl<F, In, Key, Err> KeySelector<In, Err> for Fallible<F>
where
  F: FnMut(&In) -> Result<Key, Err>,
{
  type Key = Key;

  #[inline]
  fn key_of(&mut self, input: &In) -> Result<Key, Err> { (self.0)(input) }
}
