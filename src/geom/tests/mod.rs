mod test_assembly_modes;
mod test_curve_frames;
