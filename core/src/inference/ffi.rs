//! FFI declarations for the generated model library.
//!
//! This module contains the raw FFI bindings. Use [`super::LinkedEngine`]
//! instead of calling these directly.

use std::ffi::c_void;
use std::os::raw::c_char;

use super::engine::TensorShape;

extern "C" {
    // Inference
    pub fn model_Predict(context: *mut c_void, input: *mut f32, output: *mut f32);
    pub fn model_Reset();

    // Port sizes
    pub fn model_GetInputSize(index: i32) -> i32;
    pub fn model_GetOutputSize(index: i32) -> i32;
    pub fn model_GetSinkOutputSize(index: i32) -> i32;
    pub fn model_GetNumNodes() -> i32;

    // Port shapes
    pub fn model_GetInputShape(index: i32, shape: *mut TensorShape);
    pub fn model_GetOutputShape(index: i32, shape: *mut TensorShape);
    pub fn model_GetSinkOutputShape(index: i32, shape: *mut TensorShape);

    // Metadata
    pub fn model_GetMetadata(key: *mut c_char) -> *mut c_char;
}
