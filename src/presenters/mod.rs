pub mod pixels_presenter;
