pub mod depth_points;
pub mod frustum_helper;
