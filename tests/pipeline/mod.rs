//! Integration tests for the close → classify → sign pipeline.

mod end_to_end;
