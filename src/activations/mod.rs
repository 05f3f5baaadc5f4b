//! # Activation Functions Module
//!
//! The closed set of element-wise activations a layer can use. Each activation
//! comes paired with its derivative written as a function of the activation's
//! *output* `y = f(x)`, not its input. Back-propagation only keeps the
//! post-activation outputs around, so an activation is only admissible here if
//! its derivative can be recovered from `y` alone (softmax is not).
//!
//! ## Available Activations
//!
//! | Code | Variant   | `f(x)`                | `f'` in terms of `y` |
//! |------|-----------|-----------------------|----------------------|
//! | 0    | `Linear`  | `x`                   | `1`                  |
//! | 1    | `Sigmoid` | `1 / (1 + e^(-x))`    | `y (1 - y)`          |
//! | 2    | `Tanh`    | `tanh(x)`             | `1 - y²`             |
//! | 3    | `Relu`    | `max(0, x)`           | `1 if y > 0 else 0`  |
//!
//! ## Usage Example
//!
//! ```rust
//! use pallas::activations::Activation;
//!
//! let relu = Activation::Relu;
//! let y = relu.apply(-0.5);
//! assert_eq!(y, 0.0);
//! assert_eq!(relu.derivative(y), 0.0);
//! ```

pub mod functions;

pub use functions::Activation;
