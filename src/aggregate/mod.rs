//! Aggregators built on `each`
//!
//! - [`inject`](crate::AsyncIter::inject): fold into one shared accumulator
//! - [`map`](crate::AsyncIter::map): collect one value per item, in input order
//!
//! Both hand the step a [`Supplier`](crate::Supplier) instead of an
//! [`Advancer`](crate::Advancer); supplying a value completes the item.

mod inject;
mod map;
